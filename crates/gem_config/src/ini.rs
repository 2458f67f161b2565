//! INI reader
//!
//! ```text
//! [Configuration]
//! speed: 3.5            ; `key: value` or `key = value`
//! description = a long
//!     wrapped value     # indented lines continue the previous value
//! ```
//!
//! Keys keep their case. Section and key order is preserved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw `key -> value` pairs of one section
pub type RawSection = IndexMap<String, String>;

/// A problem found while reading; the offending line is skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniIssue {
    pub line: usize,
    pub message: String,
}

/// A parsed INI file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniDocument {
    sections: IndexMap<String, RawSection>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text, collecting issues instead of failing
    pub fn parse(text: &str) -> (Self, Vec<IniIssue>) {
        let mut doc = Self::new();
        let mut issues = Vec::new();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw.starts_with(|c: char| c.is_whitespace());
            if indented {
                if let (Some(name), Some(key)) = (&section, &last_key) {
                    if let Some(value) = doc.sections.get_mut(name).and_then(|s| s.get_mut(key)) {
                        value.push('\n');
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = trimmed[1..trimmed.len() - 1].trim().to_string();
                if doc.sections.contains_key(&name) {
                    issues.push(IniIssue {
                        line,
                        message: format!("section '{}' already exists; merging", name),
                    });
                }
                doc.sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let Some(split) = trimmed.find(|c: char| c == ':' || c == '=') else {
                issues.push(IniIssue {
                    line,
                    message: format!("expected 'key: value', found '{}'", trimmed),
                });
                last_key = None;
                continue;
            };

            let key = trimmed[..split].trim();
            let value = trimmed[split + 1..].trim();
            if key.is_empty() {
                issues.push(IniIssue {
                    line,
                    message: "missing key".to_string(),
                });
                last_key = None;
                continue;
            }

            let Some(name) = &section else {
                issues.push(IniIssue {
                    line,
                    message: format!("key '{}' appears before any section header", key),
                });
                continue;
            };

            let entries = doc.sections.entry(name.clone()).or_default();
            if entries.insert(key.to_string(), value.to_string()).is_some() {
                issues.push(IniIssue {
                    line,
                    message: format!("duplicate key '{}' in section '{}'", key, name),
                });
            }
            last_key = Some(key.to_string());
        }

        (doc, issues)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&RawSection> {
        self.sections.get(name)
    }

    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &RawSection)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// Set a value, creating the section when needed
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Replace a whole section
    pub fn insert_section(&mut self, name: &str, data: RawSection) {
        self.sections.insert(name.to_string(), data);
    }

    /// Remove one key, keeping the order of the rest
    pub fn remove_key(&mut self, section: &str, key: &str) -> Option<String> {
        self.sections.get_mut(section)?.shift_remove(key)
    }

    pub fn remove_section(&mut self, name: &str) -> Option<RawSection> {
        self.sections.shift_remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}
