//! # gem_cast - Gemstone Value Casting
//!
//! Turns configuration value strings into typed [`Value`]s:
//! - **`cast`**: lenient single-pass casting through an ordered list of
//!   [`Caster`]s; never fails, unknown text stays a string
//! - **`pcast`**: a tokenizing recursive-descent parser over the same
//!   literal grammar; malformed input is logged and yields `Value::None`
//! - **`FromValue`**: typed extraction for setters and config accessors
//!
//! ## Literal Grammar
//!
//! ```text
//! 42  -7  0x1F  3.5  1e-3          numbers
//! true  False  none                keywords (case-insensitive)
//! 'text'  "text"                   quoted strings
//! [1, 2]  (1, 'a')  {'k': 1.0}     list, tuple, dict
//! Vec(1, 2, 3)  Point(0, 0)        2..4 component vectors
//! Bit(0, 4)                        32-bit mask
//! ```
//!
//! `Value`'s `Display` impl writes this grammar back out, so a value
//! printed with `to_string()` casts back to an equal value.

pub mod caster;
pub mod convert;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod value;

pub use caster::{
    register_default_casters, BitCaster, Caster, DictCaster, KeywordCaster, QuotedStringCaster,
    SequenceCaster, SequenceKind, VectorCaster,
};
pub use convert::{from_arg, FromValue};
pub use engine::CastEngine;
pub use error::{CastError, Result};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use value::{Value, Vector, VectorKind};

use once_cell::sync::Lazy;

static DEFAULT_ENGINE: Lazy<CastEngine> = Lazy::new(CastEngine::with_defaults);

/// Shared engine with the built-in casters
pub fn default_engine() -> &'static CastEngine {
    &DEFAULT_ENGINE
}

/// Cast text with the built-in casters
pub fn cast(text: &str) -> Value {
    DEFAULT_ENGINE.cast(text)
}

/// Parse text with the recursive-descent parser. Blank text is `None`.
pub fn try_pcast(text: &str) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::None);
    }
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse()
}

/// Parse text, logging malformed input and returning `Value::None` for it
pub fn pcast(text: &str) -> Value {
    match try_pcast(text) {
        Ok(value) => value,
        Err(e @ CastError::Value(_)) => {
            log::error!("Value Error (pcast): {}", e);
            Value::None
        }
        Err(e) => {
            log::error!("Syntax Error (pcast): {}", e);
            Value::None
        }
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::convert::FromValue;
    pub use crate::engine::CastEngine;
    pub use crate::error::CastError;
    pub use crate::value::{Value, Vector, VectorKind};
    pub use crate::{cast, pcast};
}
