//!
//! Distributed EM (Baum-Welch) training
//!
//! ## E-step
//!
//! `expectation`: forward-backward per observation sequence, emitting keyed
//! partial counts and the sequence likelihood.
//!
//! ## M-step
//!
//! `maximization`: partial counts grouped by state are summed and
//! normalized into the next model; likelihoods are multiplied into the
//! total log alpha.
//!
//! `driver` repeats the two steps until convergence for each random restart.
//!
pub mod decode;
pub mod driver;
pub mod executor;
pub mod expectation;
pub mod maximization;
pub mod partial;
pub mod store;
pub mod worker;

use crate::config::TrainConfig;
use crate::error::Result;
pub use driver::{BestRestart, RestartOutcome, RunState, TrainSummary, Trainer};
pub use executor::{Executor, RayonExecutor, SequentialExecutor};
use std::path::Path;
pub use store::{FsStore, Layout, Store};

///
/// Train on the local filesystem with the executor chosen by
/// `config.parallel`.
///
pub fn train(config: &TrainConfig) -> Result<TrainSummary> {
    if config.parallel {
        Trainer::new(config, &FsStore, &RayonExecutor).run()
    } else {
        Trainer::new(config, &FsStore, &SequentialExecutor).run()
    }
}

///
/// Viterbi-tag `input` with the model directory `model_dir` on the local
/// filesystem. Returns the number of tagged sequences.
///
pub fn decode(
    model_dir: &Path,
    start_state: &str,
    input: &Path,
    output: &Path,
    parallel: bool,
) -> Result<usize> {
    if parallel {
        driver::decode_with_model(&FsStore, &RayonExecutor, model_dir, start_state, input, output)
    } else {
        driver::decode_with_model(
            &FsStore,
            &SequentialExecutor,
            model_dir,
            start_state,
            input,
            output,
        )
    }
}
