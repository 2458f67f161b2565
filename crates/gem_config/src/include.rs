//! `__include__` resolution
//!
//! A section may name another config file under the `__include__` key.
//! In the main section the whole included file is merged underneath the
//! including one; in any other section only the same-named section of the
//! included file is. Included entries come first and the including file's
//! own entries override them. Includes nest, and a cycle is reported and
//! broken at the repeated file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gem_cast::Value;
use gem_core::absolute_path;

use crate::cache::ConfigCache;
use crate::error::{ConfigError, Result};
use crate::ini::{IniDocument, RawSection};

/// Key naming an included file
pub const INCLUDE_KEY: &str = "__include__";

/// Rewrites include paths before they are resolved
pub type IncludeFixup = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Reads a config file and folds in everything it includes
pub struct IncludeResolver<'a> {
    cache: &'a dyn ConfigCache,
    main_section: &'a str,
    fixup: Option<&'a IncludeFixup>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(cache: &'a dyn ConfigCache, main_section: &'a str, fixup: Option<&'a IncludeFixup>) -> Self {
        Self {
            cache,
            main_section,
            fixup,
        }
    }

    /// The merged document for `path`. Only a failure to read `path`
    /// itself is an error; broken includes are logged and skipped.
    pub fn resolve(&self, path: &Path) -> Result<IniDocument> {
        let mut visiting = vec![absolute_path(path)];
        self.resolve_nested(path, &mut visiting)
    }

    fn resolve_nested(&self, path: &Path, visiting: &mut Vec<PathBuf>) -> Result<IniDocument> {
        let document = self.cache.read(path)?;
        let mut merged = (*document).clone();

        let includes: Vec<(String, String)> = document
            .sections()
            .filter_map(|(name, data)| data.get(INCLUDE_KEY).map(|raw| (name.to_string(), raw.clone())))
            .collect();

        for (section, raw) in includes {
            merged.remove_key(&section, INCLUDE_KEY);

            let include_path = self.include_path(path, &raw);
            let key = absolute_path(&include_path);
            if visiting.contains(&key) {
                log::warn!("{}", ConfigError::IncludeCycle(key));
                continue;
            }

            visiting.push(key);
            let included = self.resolve_nested(&include_path, visiting);
            visiting.pop();

            match included {
                Ok(included) => {
                    let only = (section != self.main_section).then_some(section.as_str());
                    merged = merge_under(&merged, &included, only);
                }
                Err(e) => log::warn!("Failed to include from {}: {}", path.display(), e),
            }
        }

        Ok(merged)
    }

    /// Location of an include named inside `including`. The raw value may
    /// be quoted; relative paths resolve against the including file's
    /// directory after the fixup runs.
    pub fn include_path(&self, including: &Path, raw: &str) -> PathBuf {
        let raw = match gem_cast::cast(raw) {
            Value::String(s) => s,
            _ => raw.trim().to_string(),
        };
        let fixed = match self.fixup {
            Some(fixup) => fixup(&raw),
            None => raw,
        };

        let path = PathBuf::from(fixed);
        if path.is_relative() {
            if let Some(dir) = including.parent() {
                return dir.join(path);
            }
        }
        path
    }
}

/// Merge `included` underneath `own`.
///
/// With `only` set, just that section is merged. Otherwise sections that
/// exist only in `included` are appended after `own`'s sections.
pub fn merge_under(own: &IniDocument, included: &IniDocument, only: Option<&str>) -> IniDocument {
    let mut out = IniDocument::new();

    for (name, data) in own.sections() {
        let mut section = match only {
            Some(target) if target != name => RawSection::new(),
            _ => included.section(name).cloned().unwrap_or_default(),
        };
        for (key, value) in data {
            section.insert(key.clone(), value.clone());
        }
        out.insert_section(name, section);
    }

    if only.is_none() {
        for (name, data) in included.sections() {
            if !out.has_section(name) {
                out.insert_section(name, data.clone());
            }
        }
    }

    out
}
