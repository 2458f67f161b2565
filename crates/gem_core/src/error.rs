//! Error types for the core library

use std::path::PathBuf;
use thiserror::Error;

/// The core error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// Settings file could not be read
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML
    #[error("Invalid settings file {path}: {message}")]
    Toml { path: PathBuf, message: String },

    /// Operation is only allowed in developer builds
    #[error("{0} is not allowed in a production environment")]
    ProductionOnly(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;
