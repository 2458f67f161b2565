//! Indented-file errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndentedError {
    /// A line that does not match `[*]type [name]: args`
    #[error("Syntax error in file \"{source_name}\"; Line: {}", display_line(.line, .text))]
    Syntax {
        source_name: String,
        line: usize,
        /// Offending text, kept only when detailed errors are on
        text: Option<String>,
    },

    #[error("Failed to open indented file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_line(line: &usize, text: &Option<String>) -> String {
    match text {
        Some(text) => format!("{} ({})", text.trim(), line),
        None => line.to_string(),
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, IndentedError>;
