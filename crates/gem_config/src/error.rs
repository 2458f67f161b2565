//! Configuration errors

use std::path::PathBuf;

use gem_cast::CastError;
use thiserror::Error;

/// Errors raised by the configuration layer.
///
/// Only [`ConfigError::Contract`] is meant to reach callers as a hard
/// failure; everything else is logged at the boundary of the failing unit.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Include cycle through {0}")]
    IncludeCycle(PathBuf),

    #[error("Cache blob {path} is unusable: {message}")]
    Cache { path: PathBuf, message: String },

    #[error("Invalid value for '{key}': {source}")]
    Cast {
        key: String,
        #[source]
        source: CastError,
    },

    #[error("Missing configuration key '{0}'")]
    MissingKey(String),

    #[error("Dictionary file {path}: {message}")]
    Dictionary { path: PathBuf, message: String },

    #[error("Contract violation: {0}")]
    Contract(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConfigError>;
