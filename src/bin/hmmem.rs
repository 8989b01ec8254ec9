use clap::{Parser, Subcommand};
use env_logger::Env;
use hmmem::{
    common::CONVENTIONAL_START_STATE,
    config::TrainConfig,
    em::{self, FsStore, Store},
    error::{HmmError, Result},
};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct Opts {
    /// Number of worker threads (default: all cores)
    #[clap(short = 't', long, global = true)]
    threads: Option<usize>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train an HMM with EM from unlabeled observation sequences
    Train {
        /// Load every control parameter from this JSON file instead of the
        /// flags below
        #[clap(long)]
        config: Option<PathBuf>,
        /// Job name used in log lines
        #[clap(long, default_value = "hmmem")]
        job_name: String,
        /// Base directory of relative paths
        #[clap(long, default_value = ".")]
        storage_root: PathBuf,
        /// Observation file or directory, one sequence per line
        #[clap(short, long)]
        input: Option<PathBuf>,
        /// Output directory that does not exist yet
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Transition definitions, lines of `<from> <to> [weight]`
        #[clap(short = 'T', long)]
        transitions: Option<PathBuf>,
        /// Emission definitions, lines of `<state> <token> [weight]`
        #[clap(short = 'E', long)]
        emissions: Option<PathBuf>,
        /// Convergence threshold of total log alpha
        #[clap(short = 'c', long, default_value_t = 1e-5)]
        convergence: f64,
        /// Maximum number of EM iterations (unbounded if not given)
        #[clap(short = 'm', long)]
        max_iterations: Option<usize>,
        /// Number of random restarts
        #[clap(short = 'r', long, default_value_t = 1)]
        n_restarts: usize,
        /// Viterbi-tag the input with the model of every restart
        #[clap(long)]
        decode: bool,
        /// Base RNG seed of initial models
        #[clap(long, default_value_t = 0)]
        seed: u64,
        /// Number of part files per iteration
        #[clap(long, default_value_t = 4)]
        n_partitions: usize,
        /// Run every stage on a single thread
        #[clap(long)]
        sequential: bool,
    },
    /// Tag observation sequences with an already trained model
    Decode {
        /// Model directory (e.g. `<output>/<restart>/<iteration>`)
        #[clap(short = 'M', long)]
        model: PathBuf,
        /// Start state of the model
        #[clap(short = 's', long, default_value = CONVENTIONAL_START_STATE)]
        start_state: String,
        /// Observation file or directory
        #[clap(short, long)]
        input: PathBuf,
        /// Output file of tagged sequences
        #[clap(short, long)]
        output: PathBuf,
        /// Run on a single thread
        #[clap(long)]
        sequential: bool,
    },
}

fn required(value: &Option<PathBuf>, name: &str) -> Result<PathBuf> {
    value
        .clone()
        .ok_or_else(|| HmmError::Configuration(format!("--{} is required", name)))
}

fn train_config(command: &Commands) -> Result<TrainConfig> {
    match command {
        Commands::Train {
            config: Some(path), ..
        } => TrainConfig::from_json_file(path),
        Commands::Train {
            config: None,
            job_name,
            storage_root,
            input,
            output,
            transitions,
            emissions,
            convergence,
            max_iterations,
            n_restarts,
            decode,
            seed,
            n_partitions,
            sequential,
        } => Ok(TrainConfig {
            job_name: job_name.clone(),
            storage_root: storage_root.clone(),
            input: required(input, "input")?,
            output: required(output, "output")?,
            transitions: required(transitions, "transitions")?,
            emissions: required(emissions, "emissions")?,
            convergence: *convergence,
            max_iterations: *max_iterations,
            n_restarts: *n_restarts,
            decode: *decode,
            seed: *seed,
            n_partitions: *n_partitions,
            parallel: !*sequential,
        }),
        Commands::Decode { .. } => Err(HmmError::Configuration(
            "decode takes no training config".to_string(),
        )),
    }
}

fn run(opts: &Opts) -> Result<()> {
    if let Some(threads) = opts.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| HmmError::Configuration(e.to_string()))?;
    }
    println!("# n_threads={}", rayon::current_num_threads());

    match &opts.command {
        Commands::Train { .. } => {
            let config = train_config(&opts.command)?;
            let summary = em::train(&config)?;
            FsStore.write_new(&config.output_path().join("config.json"), &config.to_json()?)?;
            for outcome in summary.restarts.iter() {
                println!(
                    "# restart={} state={:?} iterations={} total_log_alpha={} error={}",
                    outcome.restart_index,
                    outcome.state,
                    outcome.final_iteration,
                    outcome.total_log_alpha,
                    outcome.error.as_deref().unwrap_or("-")
                );
            }
            match &summary.best {
                Some(best) => println!(
                    "# best_restart={} total_log_alpha={}",
                    best.restart_index, best.total_log_alpha
                ),
                None => {
                    return Err(HmmError::Configuration(
                        "every restart failed".to_string(),
                    ))
                }
            }
        }
        Commands::Decode {
            model,
            start_state,
            input,
            output,
            sequential,
        } => {
            let n = em::decode(model, start_state, input, output, !*sequential)?;
            info!("decoded {} sequences", n);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let opts: Opts = Opts::parse();
    println!("# started_at={}", chrono::Local::now());
    println!("# opts={:?}", opts);
    let result = run(&opts);
    println!("# finished_at={}", chrono::Local::now());
    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}
