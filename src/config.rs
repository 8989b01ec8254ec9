//!
//! Control parameters of a training run
//!
use crate::error::{HmmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

///
/// Everything a training run needs to know.
///
/// Relative paths are resolved against `storage_root`.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// name used in log lines of every stage
    pub job_name: String,
    /// base directory of relative paths
    pub storage_root: PathBuf,
    /// observation file, or directory of observation files
    pub input: PathBuf,
    /// output directory (must not contain a previous run)
    pub output: PathBuf,
    /// transition definitions `<from> <to> [weight]`
    pub transitions: PathBuf,
    /// emission definitions `<state> <token> [weight]`
    pub emissions: PathBuf,
    /// stop when total log alpha improves by less than this
    pub convergence: f64,
    /// `None` for unbounded
    pub max_iterations: Option<usize>,
    pub n_restarts: usize,
    /// run Viterbi tagging after each restart
    pub decode: bool,
    /// base seed of random initial models; restart `r` uses `seed + r`
    pub seed: u64,
    /// number of part files per iteration
    pub n_partitions: usize,
    /// rayon executor if true, sequential otherwise
    pub parallel: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            job_name: "hmmem".to_string(),
            storage_root: PathBuf::from("."),
            input: PathBuf::new(),
            output: PathBuf::new(),
            transitions: PathBuf::new(),
            emissions: PathBuf::new(),
            convergence: 1e-5,
            max_iterations: None,
            n_restarts: 1,
            decode: false,
            seed: 0,
            n_partitions: 4,
            parallel: true,
        }
    }
}

impl TrainConfig {
    ///
    /// Check the control parameters before anything is read or written.
    ///
    pub fn validate(&self) -> Result<()> {
        let bad = |message: String| Err(HmmError::Configuration(message));
        if !self.convergence.is_finite() || self.convergence < 0.0 {
            return bad(format!(
                "convergence threshold must be a finite non-negative number, got {}",
                self.convergence
            ));
        }
        if self.convergence == 0.0 && self.max_iterations.is_none() {
            return bad("zero convergence threshold needs max_iterations".to_string());
        }
        if self.max_iterations == Some(0) {
            return bad("max_iterations must be at least 1".to_string());
        }
        if self.n_restarts == 0 {
            return bad("n_restarts must be at least 1".to_string());
        }
        if self.n_partitions == 0 {
            return bad("n_partitions must be at least 1".to_string());
        }
        for (name, path) in [
            ("input", &self.input),
            ("output", &self.output),
            ("transitions", &self.transitions),
            ("emissions", &self.emissions),
        ]
        .iter()
        {
            if path.as_os_str().is_empty() {
                return bad(format!("{} path is not set", name));
            }
        }
        if !self.storage_root.is_dir() {
            return bad(format!(
                "storage root {} is not a readable directory",
                self.storage_root.display()
            ));
        }
        Ok(())
    }
    ///
    /// `path` resolved against the storage root
    ///
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.storage_root.join(path)
        }
    }
    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input)
    }
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }
    pub fn transitions_path(&self) -> PathBuf {
        self.resolve(&self.transitions)
    }
    pub fn emissions_path(&self) -> PathBuf {
        self.resolve(&self.emissions)
    }
    ///
    /// RNG seed of restart `restart`
    ///
    pub fn restart_seed(&self, restart: usize) -> u64 {
        self.seed.wrapping_add(restart as u64)
    }
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    pub fn from_json(json: &str) -> Result<TrainConfig> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| HmmError::io(path, e))?;
        TrainConfig::from_json(&json)
    }
}
