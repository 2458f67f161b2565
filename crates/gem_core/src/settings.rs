//! Runtime Settings
//!
//! Framework-wide flags that change how configuration and scene files are
//! processed. They are resolved once by the application entry point and
//! handed to the components that need them.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `GEMSTONE_CONFIG_WARNINGS=1`
//! 2. Settings file: `gemstone.toml` in the working directory
//! 3. Built-in defaults
//!
//! # Example Settings File
//!
//! ```toml
//! [settings]
//! config_warnings = true         # warn about sections without a loader
//! detailed_syntax_errors = false # echo offending lines in syntax warnings
//! use_dat_cache = false          # read/write serialized config blobs
//! developer_build = true         # allow reload helpers
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default settings file name, looked up in the working directory
pub const SETTINGS_FILE: &str = "gemstone.toml";

/// Framework runtime flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Warn when a config section has no loader
    pub config_warnings: bool,
    /// Include the offending line text in indented-file syntax warnings
    pub detailed_syntax_errors: bool,
    /// Let the OS config cache read and write `.dat` blobs
    pub use_dat_cache: bool,
    /// Developer build; reload helpers refuse to run otherwise
    pub developer_build: bool,
    /// File the settings were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_warnings: false,
            detailed_syntax_errors: false,
            use_dat_cache: false,
            developer_build: true,
            source: None,
        }
    }
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    settings: Settings,
}

impl Settings {
    /// Load settings from all sources
    pub fn load() -> Self {
        let mut settings = match Self::load_from_file(SETTINGS_FILE) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", SETTINGS_FILE);
                settings
            }
            Err(CoreError::Io { .. }) => Self::default(),
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        };

        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Load settings from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut settings = Self::from_toml_str(&content).map_err(|message| CoreError::Toml {
            path: path.to_path_buf(),
            message,
        })?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        toml::from_str::<SettingsFile>(content)
            .map(|file| file.settings)
            .map_err(|e| e.to_string())
    }

    /// Override flags from environment-style variables.
    ///
    /// `lookup` returns the raw variable value; unparseable values are
    /// ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flags: [(&str, &mut bool); 4] = [
            ("GEMSTONE_CONFIG_WARNINGS", &mut self.config_warnings),
            ("GEMSTONE_DETAILED_SYNTAX", &mut self.detailed_syntax_errors),
            ("GEMSTONE_USE_DAT", &mut self.use_dat_cache),
            ("GEMSTONE_DEVELOPER", &mut self.developer_build),
        ];

        for (key, flag) in flags {
            if let Some(raw) = lookup(key) {
                match parse_flag(&raw) {
                    Some(value) => *flag = value,
                    None => log::warn!("Ignoring {}={}: expected a boolean", key, raw),
                }
            }
        }
    }

    /// Fail unless this is a developer build
    pub fn require_developer(&self, operation: &str) -> Result<()> {
        if self.developer_build {
            Ok(())
        } else {
            Err(CoreError::ProductionOnly(operation.to_string()))
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
