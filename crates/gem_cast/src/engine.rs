//! Cast engine - ordered caster list plus the primitive fast path

use crate::caster::{register_default_casters, Caster};
use crate::lexer::parse_integer;
use crate::value::Value;

/// Converts raw config text into [`Value`]s.
///
/// Integers and floats are tried first; otherwise the registered casters are
/// consulted in registration order and the first one that accepts the text
/// converts it. Text nothing accepts stays a (trimmed) string.
pub struct CastEngine {
    casters: Vec<Box<dyn Caster>>,
}

impl CastEngine {
    /// Create an engine with no casters
    pub fn new() -> Self {
        Self {
            casters: Vec::new(),
        }
    }

    /// Create an engine with the built-in casters registered
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        register_default_casters(&mut engine);
        engine
    }

    /// Append a caster; earlier registrations take precedence
    pub fn register<C: Caster + 'static>(&mut self, caster: C) -> &mut Self {
        self.register_boxed(Box::new(caster));
        self
    }

    /// Append a boxed caster
    pub fn register_boxed(&mut self, caster: Box<dyn Caster>) {
        log::trace!("Registered caster '{}'", caster.name());
        self.casters.push(caster);
    }

    /// Names of the registered casters, in order
    pub fn caster_names(&self) -> Vec<&str> {
        self.casters.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    /// The caster that would convert `text`, if any
    pub fn select(&self, text: &str) -> Option<&dyn Caster> {
        let text = text.trim();
        self.casters
            .iter()
            .find(|c| c.accepted(text))
            .map(|c| c.as_ref())
    }

    /// Cast text to a value. Never fails: a caster whose conversion fails
    /// is logged and the text is returned as a string.
    pub fn cast(&self, text: &str) -> Value {
        let text = text.trim();

        if let Some(n) = parse_integer(text) {
            return Value::Int(n);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }

        match self.select(text) {
            Some(caster) => match caster.convert(text, self) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("{} caster failed on '{}': {}", caster.name(), text, e);
                    Value::String(text.to_string())
                }
            },
            None => Value::String(text.to_string()),
        }
    }
}

impl Default for CastEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CastEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastEngine")
            .field("casters", &self.caster_names())
            .finish()
    }
}
