//! # gem_config - Gemstone Configuration
//!
//! INI-style config files driving object setup:
//! - **Reader**: [`IniDocument`] keeps section and key order and reports
//!   bad lines without giving up on the file
//! - **Caches**: parsed files are shared per path and re-read when the
//!   source changes ([`OsConfigCache`], [`VfsConfigCache`], [`RawConfigCache`])
//! - **Includes**: `__include__` pulls another file underneath the current one
//! - **Configurable**: casts the main section and dispatches keys to the
//!   setters a [`ConfigTarget`] registers in its [`ConfigBindings`]
//! - **Dictionary files**: JSON data files as ordered [`Value`] maps
//!
//! ## Example
//!
//! ```ignore
//! struct Hero { speed: f64 }
//!
//! impl ConfigTarget for Hero {
//!     fn bindings() -> ConfigBindings<Self> {
//!         ConfigBindings::new().setter("speed", |h: &mut Hero, v: f64| h.speed = v)
//!     }
//! }
//!
//! let mut hero = Hero { speed: 0.0 };
//! let mut config = Configurable::new(default_cache(&settings), ConfigOptions::from_settings(&settings));
//! config.load(&mut hero, "hero.ini", None);
//! config.initialize(&mut hero)?;
//! ```
//!
//! [`Value`]: gem_cast::Value

pub mod bindings;
pub mod cache;
pub mod configurable;
pub mod dictionary;
pub mod error;
pub mod include;
pub mod ini;
pub mod vfs;

pub use bindings::{AttributeBag, ConfigBindings, ConfigTarget, SectionData};
pub use cache::{default_cache, ConfigCache, OsConfigCache, RawConfigCache, VfsConfigCache};
pub use configurable::{ConfigOptions, Configurable, InitReport, LoadReport, DEFAULT_SECTION};
pub use dictionary::{load_file, DictionaryFile};
pub use error::{ConfigError, Result};
pub use include::{merge_under, IncludeFixup, IncludeResolver, INCLUDE_KEY};
pub use ini::{IniDocument, IniIssue, RawSection};
pub use vfs::{MemoryFileSystem, OsFileSystem, VirtualFileSystem};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bindings::{AttributeBag, ConfigBindings, ConfigTarget, SectionData};
    pub use crate::cache::{default_cache, ConfigCache, OsConfigCache};
    pub use crate::configurable::{ConfigOptions, Configurable};
    pub use crate::error::{ConfigError, Result};
    pub use crate::ini::IniDocument;
}
