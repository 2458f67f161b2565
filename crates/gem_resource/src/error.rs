//! Resource errors

use std::path::PathBuf;

use gem_config::ConfigError;
use gem_core::CoreError;
use thiserror::Error;

/// Errors raised while describing or running exports
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export line '{0}': malformed file name")]
    MalformedFilename(String),

    #[error("Export line '{line}': malformed options at '{rest}'")]
    MalformedOptions { line: String, rest: String },

    #[error("Unknown converter '{0}'")]
    UnknownConverter(String),

    #[error("Export source {0} does not exist")]
    MissingSource(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ExportError>;
