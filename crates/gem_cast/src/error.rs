//! Cast errors

use thiserror::Error;

/// Errors produced while turning text into a [`Value`](crate::Value)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    #[error("Syntax error at column {column}: {message}")]
    Syntax { message: String, column: usize },

    #[error("Value error: {0}")]
    Value(String),

    #[error("Expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },
}

impl CastError {
    pub(crate) fn syntax(message: impl Into<String>, column: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            column,
        }
    }
}

/// Cast result type
pub type Result<T> = std::result::Result<T, CastError>;
