//!
//! Storage of small text files and the on-disk layout of a training run
//!
//! ```text
//! <output>/summary.json
//! <output>/<restart>/0/em_model_params.txt       seed model
//! <output>/<restart>/<i>/part-00000 ...          model of iteration i
//! <output>/<restart>/<i>/total_log_alpha.txt     total log alpha of iteration i
//! <output>/<restart>/viterbi/part-00000          tagged sequences
//! ```
//!
use crate::error::{HmmError, Result};
use crate::model::text::{alpha_from_text, ModelReader};
use crate::model::{ModelParameters, TextSource};
use crate::observation::Observations;
use crate::prob::LogProb;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MODEL_PARAMS_FILE_NAME: &str = "em_model_params.txt";
pub const TOTAL_LOG_ALPHA_FILE_NAME: &str = "total_log_alpha.txt";
pub const VITERBI_DIR_NAME: &str = "viterbi";
pub const SUMMARY_FILE_NAME: &str = "summary.json";

///
/// Name of the `index`-th output file of a stage
///
pub fn part_file_name(index: usize) -> String {
    format!("part-{:05}", index)
}

///
/// Place to read and write small text files
///
pub trait Store: Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    ///
    /// Create a new file. Fails if the file already exists.
    ///
    fn write_new(&self, path: &Path, contents: &str) -> Result<()>;
    ///
    /// Files (not directories) in `dir`, sorted by name
    ///
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

///
/// Store on the local filesystem
///
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl Store for FsStore {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| HmmError::io(path, e))
    }
    fn write_new(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HmmError::io(parent, e))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| HmmError::io(path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| HmmError::io(path, e))?;
        debug!("wrote {}", path.display());
        Ok(())
    }
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| HmmError::io(dir, e))? {
            let entry = entry.map_err(|e| HmmError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

///
/// Paths of one training run under its output directory
///
#[derive(Debug, Clone)]
pub struct Layout {
    output: PathBuf,
}

impl Layout {
    pub fn new<P: Into<PathBuf>>(output: P) -> Layout {
        Layout {
            output: output.into(),
        }
    }
    pub fn output(&self) -> &Path {
        &self.output
    }
    pub fn restart_dir(&self, restart: usize) -> PathBuf {
        self.output.join(restart.to_string())
    }
    ///
    /// Model directory of iteration `i` (0 is the seed model)
    ///
    pub fn iteration_dir(&self, restart: usize, iteration: usize) -> PathBuf {
        self.restart_dir(restart).join(iteration.to_string())
    }
    pub fn seed_model_file(&self, restart: usize) -> PathBuf {
        self.iteration_dir(restart, 0).join(MODEL_PARAMS_FILE_NAME)
    }
    pub fn total_log_alpha_file(&self, restart: usize, iteration: usize) -> PathBuf {
        self.iteration_dir(restart, iteration)
            .join(TOTAL_LOG_ALPHA_FILE_NAME)
    }
    pub fn part_file(&self, restart: usize, iteration: usize, index: usize) -> PathBuf {
        self.iteration_dir(restart, iteration)
            .join(part_file_name(index))
    }
    pub fn viterbi_file(&self, restart: usize) -> PathBuf {
        self.restart_dir(restart)
            .join(VITERBI_DIR_NAME)
            .join(part_file_name(0))
    }
    pub fn summary_file(&self) -> PathBuf {
        self.output.join(SUMMARY_FILE_NAME)
    }
}

///
/// Load the model parameters of a model directory: every file except the
/// reserved alpha file.
///
pub fn load_model<S: Store + ?Sized>(store: &S, dir: &Path) -> Result<ModelParameters> {
    if !store.is_dir(dir) {
        return Err(HmmError::MissingModel(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let mut reader = ModelReader::new();
    for path in store.list(dir)? {
        if path.file_name().map_or(false, |n| n == TOTAL_LOG_ALPHA_FILE_NAME) {
            continue;
        }
        let text = store.read_to_string(&path)?;
        let name = path.display().to_string();
        reader.read(TextSource::new(&name, &text))?;
    }
    if reader.n_files() == 0 {
        return Err(HmmError::MissingModel(format!(
            "no parameter files in {}",
            dir.display()
        )));
    }
    Ok(reader.finish())
}

///
/// Read the reserved alpha file of a model directory
///
pub fn load_total_log_alpha<S: Store + ?Sized>(store: &S, dir: &Path) -> Result<LogProb> {
    let path = dir.join(TOTAL_LOG_ALPHA_FILE_NAME);
    let text = store.read_to_string(&path)?;
    let name = path.display().to_string();
    alpha_from_text(TextSource::new(&name, &text))
}

///
/// Load observation sequences from a file, or from every file of a
/// directory concatenated in name order. Positions are byte offsets in the
/// concatenation.
///
pub fn load_observations<S: Store + ?Sized>(store: &S, input: &Path) -> Result<Observations> {
    let files = if store.is_dir(input) {
        store.list(input)?
    } else if store.exists(input) {
        vec![input.to_path_buf()]
    } else {
        return Err(HmmError::Configuration(format!(
            "input {} does not exist",
            input.display()
        )));
    };
    let mut observations = Observations::default();
    let mut offset = 0;
    for path in files {
        let text = store.read_to_string(&path)?;
        observations.extend(Observations::parse(&text, offset));
        offset += text.len() as u64;
    }
    debug!(
        "loaded {} sequences ({} tokens) from {}",
        observations.len(),
        observations.n_tokens(),
        input.display()
    );
    Ok(observations)
}
