//!
//! Error types of distributed HMM EM
//!
//! Every variant is fatal to the restart that raised it; nothing here is
//! retried by the training loop.
//!
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HmmError {
    /// malformed line in any text input
    #[error("parse error at {location}: {message}")]
    Parse { location: String, message: String },

    /// same transition/emission key defined (or read) twice
    #[error("duplicate key {key} at {location}")]
    DuplicateKey { key: String, location: String },

    /// parameters of a prior iteration cannot be located
    #[error("missing model parameters: {0}")]
    MissingModel(String),

    /// unreadable storage location or bad control parameters
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HmmError {
    ///
    /// short-hand of `HmmError::Parse`
    ///
    pub fn parse<L: ToString, M: ToString>(location: L, message: M) -> HmmError {
        HmmError::Parse {
            location: location.to_string(),
            message: message.to_string(),
        }
    }
    ///
    /// short-hand of `HmmError::DuplicateKey`
    ///
    pub fn duplicate<K: ToString, L: ToString>(key: K, location: L) -> HmmError {
        HmmError::DuplicateKey {
            key: key.to_string(),
            location: location.to_string(),
        }
    }
    ///
    /// wrap `std::io::Error` with the path it happened on
    ///
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> HmmError {
        HmmError::Io {
            path: path.into(),
            source,
        }
    }
}

///
/// A worker keeps its setup failure and returns it once per record, so the
/// error has to be reproducible with its kind intact.
///
impl Clone for HmmError {
    fn clone(&self) -> HmmError {
        match self {
            HmmError::Parse { location, message } => HmmError::parse(location, message),
            HmmError::DuplicateKey { key, location } => HmmError::duplicate(key, location),
            HmmError::MissingModel(message) => HmmError::MissingModel(message.clone()),
            HmmError::Configuration(message) => HmmError::Configuration(message.clone()),
            HmmError::Io { path, source } => HmmError::Io {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            HmmError::Json(err) => {
                HmmError::Json(<serde_json::Error as serde::de::Error>::custom(err))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HmmError>;
