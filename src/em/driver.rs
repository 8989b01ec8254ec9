//!
//! Training loop over EM iterations and random restarts
//!
//! Each restart is a small state machine
//!
//! ```text
//! Seeding -> Iterating -> Converged
//!                      -> IterationLimitReached
//! ```
//!
//! Iteration `i` reads the model of iteration `i-1`, runs the expectation
//! over every sequence and the maximization over every group, and writes the
//! model and total log alpha of iteration `i`. Its total log alpha is the
//! likelihood of the corpus under the model of iteration `i-1`.
//!
use super::decode::decode_to_file;
use super::executor::Executor;
use super::expectation::ExpectationTask;
use super::maximization::maximize;
use super::store::{load_observations, load_total_log_alpha, Layout, Store};
use crate::config::TrainConfig;
use crate::error::{HmmError, Result};
use crate::model::{InitialModel, TextSource};
use crate::observation::Observations;
use crate::prob::LogProb;
use log::{error, info, warn};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::path::{Path, PathBuf};

///
/// State of one restart
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Seeding,
    Iterating,
    Converged,
    IterationLimitReached,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Converged | RunState::IterationLimitReached)
    }
}

///
/// What happened in one restart
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RestartOutcome {
    pub restart_index: usize,
    pub seed: u64,
    /// last state reached (not terminal if the restart failed)
    pub state: RunState,
    /// last finished iteration (0 if none)
    pub final_iteration: usize,
    /// total log alpha of the final iteration
    pub total_log_alpha: LogProb,
    /// total log alpha of iterations 1, 2, ...
    pub history: Vec<LogProb>,
    pub start_state: Option<String>,
    pub viterbi_output: Option<PathBuf>,
    /// set if the restart was aborted
    pub error: Option<String>,
}

impl RestartOutcome {
    fn new(restart_index: usize, seed: u64) -> Self {
        RestartOutcome {
            restart_index,
            seed,
            state: RunState::Seeding,
            final_iteration: 0,
            total_log_alpha: LogProb::absent(),
            history: Vec::new(),
            start_state: None,
            viterbi_output: None,
            error: None,
        }
    }
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

///
/// Restart with the highest final total log alpha
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BestRestart {
    pub restart_index: usize,
    pub total_log_alpha: LogProb,
}

///
/// Outcome of all restarts of a run
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainSummary {
    pub job_name: String,
    pub restarts: Vec<RestartOutcome>,
    /// `None` if every restart failed
    pub best: Option<BestRestart>,
}

impl TrainSummary {
    ///
    /// Pick the best among restarts that did not fail. Ties keep the
    /// earlier restart.
    ///
    pub fn new(job_name: &str, restarts: Vec<RestartOutcome>) -> TrainSummary {
        let mut best: Option<BestRestart> = None;
        for outcome in restarts.iter().filter(|o| !o.is_failed()) {
            match &best {
                Some(b) if outcome.total_log_alpha <= b.total_log_alpha => {}
                _ => {
                    best = Some(BestRestart {
                        restart_index: outcome.restart_index,
                        total_log_alpha: outcome.total_log_alpha,
                    })
                }
            }
        }
        TrainSummary {
            job_name: job_name.to_string(),
            restarts,
            best,
        }
    }
    pub fn n_failed(&self) -> usize {
        self.restarts.iter().filter(|o| o.is_failed()).count()
    }
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

///
/// Runs every restart of a training job
///
pub struct Trainer<'a, S: Store + ?Sized, E: Executor> {
    config: &'a TrainConfig,
    store: &'a S,
    executor: &'a E,
    layout: Layout,
}

impl<'a, S: Store + ?Sized, E: Executor> Trainer<'a, S, E> {
    pub fn new(config: &'a TrainConfig, store: &'a S, executor: &'a E) -> Self {
        Trainer {
            config,
            store,
            executor,
            layout: Layout::new(config.output_path()),
        }
    }
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
    ///
    /// Validate the config, load the corpus, run all restarts and write the
    /// summary. A failing restart is recorded and the others still run.
    ///
    pub fn run(&self) -> Result<TrainSummary> {
        self.config.validate()?;
        if self.store.exists(self.layout.output()) {
            return Err(HmmError::Configuration(format!(
                "output {} already exists",
                self.layout.output().display()
            )));
        }
        let observations = load_observations(self.store, &self.config.input_path())?;
        if observations.is_empty() {
            return Err(HmmError::Configuration(format!(
                "no observation sequences in {}",
                self.config.input_path().display()
            )));
        }
        info!(
            "{}: {} sequences, {} restarts, {} executor",
            self.config.job_name,
            observations.len(),
            self.config.n_restarts,
            self.executor.name()
        );

        let restarts: Vec<RestartOutcome> = (0..self.config.n_restarts)
            .map(|restart| self.run_restart(restart, &observations))
            .collect();
        let summary = TrainSummary::new(&self.config.job_name, restarts);
        match &summary.best {
            Some(best) => info!(
                "{}: max total log alpha {} produced by restart {}",
                self.config.job_name, best.total_log_alpha, best.restart_index
            ),
            None => warn!("{}: every restart failed", self.config.job_name),
        }
        self.store
            .write_new(&self.layout.summary_file(), &summary.to_json()?)?;
        Ok(summary)
    }
    ///
    /// Run one restart; an error aborts only this restart.
    ///
    pub fn run_restart(&self, restart: usize, observations: &Observations) -> RestartOutcome {
        let mut outcome = RestartOutcome::new(restart, self.config.restart_seed(restart));
        if let Err(err) = self.train(restart, observations, &mut outcome) {
            error!(
                "{}: restart {} aborted in state {:?}: {}",
                self.config.job_name, restart, outcome.state, err
            );
            outcome.error = Some(err.to_string());
        }
        outcome
    }
    fn train(
        &self,
        restart: usize,
        observations: &Observations,
        outcome: &mut RestartOutcome,
    ) -> Result<()> {
        let start_state = self.seed(restart, outcome.seed)?;
        outcome.start_state = Some(start_state.clone());
        outcome.state = RunState::Iterating;

        let mut prev_total = LogProb::absent();
        while !outcome.state.is_terminal() {
            let iteration = outcome.final_iteration + 1;
            let total = self.iterate(restart, iteration, &start_state, observations)?;
            outcome.final_iteration = iteration;
            outcome.total_log_alpha = total;
            outcome.history.push(total);
            info!(
                "{}-{}: restart {} total log alpha {}",
                self.config.job_name, iteration, restart, total
            );

            if total.log_delta(prev_total) < self.config.convergence {
                outcome.state = RunState::Converged;
            } else if self
                .config
                .max_iterations
                .map_or(false, |max| iteration >= max)
            {
                outcome.state = RunState::IterationLimitReached;
            }
            prev_total = total;
        }
        info!(
            "{}: restart {} {:?} after {} iterations",
            self.config.job_name, restart, outcome.state, outcome.final_iteration
        );

        if self.config.decode {
            let model_dir = self.layout.iteration_dir(restart, outcome.final_iteration);
            let output = self.layout.viterbi_file(restart);
            info!("{}-viterbi: restart {}", self.config.job_name, restart);
            decode_to_file(
                self.executor,
                self.store,
                &model_dir,
                &start_state,
                observations,
                &output,
            )?;
            outcome.viterbi_output = Some(output);
        }
        Ok(())
    }
    ///
    /// Seeding: draw the random initial model and write it as iteration 0.
    /// Returns the start state.
    ///
    fn seed(&self, restart: usize, seed: u64) -> Result<String> {
        let transitions_path = self.config.transitions_path();
        let emissions_path = self.config.emissions_path();
        let transitions = self.store.read_to_string(&transitions_path)?;
        let emissions = self.store.read_to_string(&emissions_path)?;
        let t_name = transitions_path.display().to_string();
        let e_name = emissions_path.display().to_string();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let init = InitialModel::seed(
            TextSource::new(&t_name, &transitions),
            TextSource::new(&e_name, &emissions),
            &mut rng,
        )?;
        self.store
            .write_new(&self.layout.seed_model_file(restart), &init.params.to_text())?;
        info!(
            "{}: restart {} seeded with seed {} ({} transitions, {} emissions, start state {})",
            self.config.job_name,
            restart,
            seed,
            init.params.n_transitions(),
            init.params.n_emissions(),
            init.start_state
        );
        Ok(init.start_state)
    }
    ///
    /// One EM round. Returns the total log alpha read back from the
    /// reserved file of the new iteration.
    ///
    fn iterate(
        &self,
        restart: usize,
        iteration: usize,
        start_state: &str,
        observations: &Observations,
    ) -> Result<LogProb> {
        let prev_dir = self.layout.iteration_dir(restart, iteration - 1);
        let worker = ExpectationTask::worker(self.store, &prev_dir, start_state);
        let partials = self.executor.map_records(&worker, observations)?;
        let maximized = maximize(self.executor, partials)?;
        maximized.write(
            self.store,
            &self.layout,
            restart,
            iteration,
            self.config.n_partitions,
        )?;
        load_total_log_alpha(self.store, &self.layout.iteration_dir(restart, iteration))
    }
}

///
/// Tag `input` with an already trained model directory and write the lines
/// to `output`.
///
pub fn decode_with_model<S: Store + ?Sized, E: Executor>(
    store: &S,
    executor: &E,
    model_dir: &Path,
    start_state: &str,
    input: &Path,
    output: &Path,
) -> Result<usize> {
    let observations = load_observations(store, input)?;
    decode_to_file(executor, store, model_dir, start_state, &observations, output)
}
