//! Dictionary files
//!
//! Plain key/value data files. Only JSON is understood; the top-level object
//! keeps its key order.

use std::path::Path;

use gem_cast::Value;
use indexmap::IndexMap;

use crate::error::{ConfigError, Result};

/// Parsed contents of a dictionary file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionaryFile {
    data: IndexMap<String, Value>,
}

impl DictionaryFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, picking the parser from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if extension != "json" {
            return Err(ConfigError::Dictionary {
                path: path.to_path_buf(),
                message: format!("unsupported file type '{}'", extension),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|message| ConfigError::Dictionary {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse a JSON object
    pub fn from_json_str(text: &str) -> std::result::Result<Self, String> {
        let parsed: IndexMap<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| e.to_string())?;

        Ok(Self {
            data: parsed
                .into_iter()
                .map(|(key, value)| (key, json_to_value(value)))
                .collect(),
        })
    }

    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Load a dictionary file, logging failures
pub fn load_file(path: impl AsRef<Path>) -> Option<DictionaryFile> {
    match DictionaryFile::load(path) {
        Ok(file) => Some(file),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}

fn json_to_value(value: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match value {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        Json::Object(map) => Value::Dict(
            map.into_iter()
                .map(|(key, value)| (Value::String(key), json_to_value(value)))
                .collect(),
        ),
    }
}
