//! Configurable objects
//!
//! A [`Configurable`] loads one config file (plus everything it includes)
//! for a [`ConfigTarget`]:
//!
//! 1. `load` casts the main section into a key/value mapping and hands every
//!    other section to the target's section loaders.
//! 2. Callers may `pop`/`get` individual keys to special-case them.
//! 3. `initialize` dispatches every remaining key to its setter and empties
//!    the mapping.
//!
//! Bad input never aborts a load: missing files, unknown sections, missing
//! setters and mistyped values are logged and skipped. Calling `initialize`
//! before `load` is a caller bug and fails with [`ConfigError::Contract`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gem_cast::{CastEngine, FromValue, Value};
use gem_core::{loader_name, setter_name, Settings};
use indexmap::IndexMap;

use crate::bindings::{ConfigBindings, ConfigTarget, SectionData, SectionOutcome};
use crate::cache::ConfigCache;
use crate::error::{ConfigError, Result};
use crate::include::{IncludeFixup, IncludeResolver};
use crate::ini::{IniDocument, RawSection};

/// Section read into the key/value mapping unless told otherwise
pub const DEFAULT_SECTION: &str = "Configuration";

/// How a [`Configurable`] reads its file
#[derive(Clone)]
pub struct ConfigOptions {
    /// Main section name
    pub section: String,
    /// Store keys without a setter in the target's attribute bag
    pub auto_configure: bool,
    /// Warn about sections without a loader
    pub config_warnings: bool,
    /// Rewrites `__include__` paths before resolution
    pub fixup_include_path: Option<IncludeFixup>,
    /// Engine used to cast raw values
    pub engine: Arc<CastEngine>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            section: DEFAULT_SECTION.to_string(),
            auto_configure: false,
            config_warnings: false,
            fixup_include_path: None,
            engine: Arc::new(CastEngine::with_defaults()),
        }
    }
}

impl ConfigOptions {
    /// Defaults with the warning flag taken from the runtime settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            config_warnings: settings.config_warnings,
            ..Self::default()
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_auto_configure(mut self, enabled: bool) -> Self {
        self.auto_configure = enabled;
        self
    }

    pub fn with_config_warnings(mut self, enabled: bool) -> Self {
        self.config_warnings = enabled;
        self
    }

    pub fn with_include_fixup<F>(mut self, fixup: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.fixup_include_path = Some(Arc::new(fixup));
        self
    }

    pub fn with_engine(mut self, engine: Arc<CastEngine>) -> Self {
        self.engine = engine;
        self
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("section", &self.section)
            .field("auto_configure", &self.auto_configure)
            .field("config_warnings", &self.config_warnings)
            .field("fixup_include_path", &self.fixup_include_path.is_some())
            .finish()
    }
}

/// What `load` did with each section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The file (or its cached parse) was available
    pub found: bool,
    pub loaded_sections: Vec<String>,
    pub fallback_sections: Vec<String>,
    pub unhandled_sections: Vec<String>,
}

/// What `initialize` did with each key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Keys passed to a setter
    pub applied: Vec<String>,
    /// Keys stored in the attribute bag
    pub auto_assigned: Vec<String>,
    /// Keys without a setter, dropped
    pub missing: Vec<String>,
    /// Keys whose value the setter could not take, dropped
    pub rejected: Vec<String>,
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Config-file driven setup of a `T`
pub struct Configurable<T: ConfigTarget> {
    cache: Arc<dyn ConfigCache>,
    options: ConfigOptions,
    bindings: ConfigBindings<T>,
    path: Option<PathBuf>,
    configuration: IndexMap<String, Value>,
    document: Option<IniDocument>,
    loaded: bool,
}

impl<T: ConfigTarget> Configurable<T> {
    pub fn new(cache: Arc<dyn ConfigCache>, options: ConfigOptions) -> Self {
        Self {
            cache,
            options,
            bindings: T::bindings(),
            path: None,
            configuration: IndexMap::new(),
            document: None,
            loaded: false,
        }
    }

    /// Load `path`, optionally switching the main section.
    ///
    /// A missing or unreadable file is logged and leaves an empty mapping;
    /// it still counts as loaded.
    pub fn load(&mut self, target: &mut T, path: impl AsRef<Path>, section: Option<&str>) -> LoadReport {
        let path = path.as_ref();
        if let Some(section) = section {
            self.options.section = section.to_string();
        }
        self.path = Some(path.to_path_buf());
        self.configuration.clear();
        self.document = None;
        self.loaded = true;

        let mut report = LoadReport::default();
        let resolver = IncludeResolver::new(
            self.cache.as_ref(),
            &self.options.section,
            self.options.fixup_include_path.as_ref(),
        );
        let document = match resolver.resolve(path) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Failed to load config for {}: {}", short_type_name::<T>(), e);
                return report;
            }
        };
        report.found = true;

        if let Some(main) = document.section(&self.options.section) {
            for (key, raw) in main {
                self.configuration
                    .insert(key.clone(), self.options.engine.cast(raw));
            }
        }

        for (name, raw) in document.sections() {
            if name == self.options.section {
                continue;
            }
            let data = self.cast_section(raw);
            let outcome = self.bindings.load_section(target, name, &data);
            self.report_section(&mut report, name, outcome);
        }

        self.document = Some(document);
        report
    }

    fn cast_section(&self, raw: &RawSection) -> SectionData {
        raw.iter()
            .map(|(key, value)| (key.clone(), self.options.engine.cast(value)))
            .collect()
    }

    fn report_section(&self, report: &mut LoadReport, name: &str, outcome: SectionOutcome) {
        let warn = self.options.config_warnings;
        if warn && outcome != SectionOutcome::Loaded {
            log::warn!(
                "Failed to load section for {}. Section loader \"{}\" does not exist",
                short_type_name::<T>(),
                loader_name(name)
            );
        }

        match outcome {
            SectionOutcome::Loaded => report.loaded_sections.push(name.to_string()),
            SectionOutcome::Fallback => report.fallback_sections.push(name.to_string()),
            SectionOutcome::Unhandled => {
                if warn {
                    log::warn!(
                        "{} does not implement general section loader",
                        short_type_name::<T>()
                    );
                }
                report.unhandled_sections.push(name.to_string());
            }
        }
    }

    /// Dispatch every remaining key to its setter, then clear the mapping
    pub fn initialize(&mut self, target: &mut T) -> Result<InitReport> {
        if !self.loaded {
            return Err(ConfigError::Contract(format!(
                "initialize() called on {} before load()",
                short_type_name::<T>()
            )));
        }

        let mut report = InitReport::default();
        for (key, value) in std::mem::take(&mut self.configuration) {
            log::debug!("({}) {}: {}", short_type_name::<T>(), setter_name(&key), value);

            match self.bindings.apply(target, &key, value.clone()) {
                Some(Ok(())) => report.applied.push(key),
                Some(Err(source)) => {
                    log::warn!("{}", ConfigError::Cast { key: key.clone(), source });
                    report.rejected.push(key);
                }
                None if self.options.auto_configure => match target.attributes() {
                    Some(bag) => {
                        bag.set(key.clone(), value);
                        report.auto_assigned.push(key);
                    }
                    None => {
                        log::warn!(
                            "{} has no attribute storage; dropping '{}'",
                            short_type_name::<T>(),
                            key
                        );
                        report.missing.push(key);
                    }
                },
                None => {
                    log::warn!(
                        "{} does not implement setter: {}",
                        short_type_name::<T>(),
                        setter_name(&key)
                    );
                    report.missing.push(key);
                }
            }
        }

        self.document = None;
        Ok(report)
    }

    /// Load the same file again and initialize
    pub fn reload(&mut self, target: &mut T) -> Result<InitReport> {
        let path = self.path.clone().ok_or_else(|| {
            ConfigError::Contract(format!(
                "reload() called on {} before load()",
                short_type_name::<T>()
            ))
        })?;
        self.load(target, path, None);
        self.initialize(target)
    }

    /// Remove and return a value
    pub fn pop(&mut self, key: &str) -> Option<Value> {
        self.configuration.shift_remove(key)
    }

    pub fn pop_or(&mut self, key: &str, default: Value) -> Value {
        self.pop(key).unwrap_or(default)
    }

    /// Remove a value and convert it
    pub fn pop_as<A: FromValue>(&mut self, key: &str) -> Result<A> {
        let value = self
            .pop(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        A::from_value(value).map_err(|source| ConfigError::Cast {
            key: key.to_string(),
            source,
        })
    }

    /// Remove a value and convert it, using `default` when it is absent
    pub fn pop_as_or<A: FromValue>(&mut self, key: &str, default: A) -> Result<A> {
        match self.pop_as(key) {
            Err(ConfigError::MissingKey(_)) => Ok(default),
            other => other,
        }
    }

    /// Remove a value and pass it to `f`
    pub fn pop_call<R>(&mut self, key: &str, f: impl FnOnce(Value) -> R) -> Result<R> {
        self.pop(key)
            .map(f)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Convert a copy of a value
    pub fn get_as<A: FromValue>(&self, key: &str) -> Result<A> {
        let value = self
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        A::from_value(value).map_err(|source| ConfigError::Cast {
            key: key.to_string(),
            source,
        })
    }

    /// Pass a value to `f` without removing it
    pub fn get_call<R>(&self, key: &str, f: impl FnOnce(&Value) -> R) -> Result<R> {
        self.get(key)
            .map(f)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// The cast main-section mapping not yet consumed
    pub fn configuration(&self) -> &IndexMap<String, Value> {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.configuration
    }

    /// The merged document of the last load, until `initialize` runs
    pub fn document(&self) -> Option<&IniDocument> {
        self.document.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn section(&self) -> &str {
        &self.options.section
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    pub fn bindings(&self) -> &ConfigBindings<T> {
        &self.bindings
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl<T: ConfigTarget> fmt::Debug for Configurable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurable")
            .field("target", &short_type_name::<T>())
            .field("path", &self.path)
            .field("options", &self.options)
            .field("configuration", &self.configuration)
            .field("loaded", &self.loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::AttributeBag;
    use crate::cache::VfsConfigCache;
    use crate::vfs::MemoryFileSystem;

    #[derive(Debug, Default)]
    struct Hero {
        speed: f64,
        name: String,
        flags: Vec<bool>,
        states: Vec<String>,
        extra: AttributeBag,
    }

    impl ConfigTarget for Hero {
        fn bindings() -> ConfigBindings<Self> {
            ConfigBindings::new()
                .setter("speed", |h: &mut Hero, v: f64| h.speed = v)
                .setter("name", |h: &mut Hero, v: String| h.name = v)
                .setter("flags", |h: &mut Hero, v: Vec<bool>| h.flags = v)
                .section("AnimationStates", |h: &mut Hero, data: &SectionData| {
                    h.states = data.keys().cloned().collect();
                })
        }

        fn attributes(&mut self) -> Option<&mut AttributeBag> {
            Some(&mut self.extra)
        }
    }

    fn fixture(files: &[(&str, &str)]) -> Arc<dyn ConfigCache> {
        let fs = Arc::new(MemoryFileSystem::new());
        for (path, text) in files {
            fs.insert(*path, *text);
        }
        Arc::new(VfsConfigCache::new(fs))
    }

    #[test]
    fn test_load_and_initialize() {
        let cache = fixture(&[(
            "hero.ini",
            "[Configuration]\nspeed: 3.5\nname: 'Hero'\nflags: [true, false]\n",
        )]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());

        let loaded = config.load(&mut hero, "hero.ini", None);
        assert!(loaded.found);
        assert_eq!(config.get("speed"), Some(&Value::Float(3.5)));

        let report = config.initialize(&mut hero).unwrap();
        assert_eq!(report.applied, vec!["speed", "name", "flags"]);
        assert_eq!(hero.speed, 3.5);
        assert_eq!(hero.name, "Hero");
        assert_eq!(hero.flags, vec![true, false]);
        assert!(config.configuration().is_empty());
    }

    #[test]
    fn test_initialize_before_load_is_contract_error() {
        let cache = fixture(&[]);
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());
        assert!(matches!(
            config.initialize(&mut Hero::default()),
            Err(ConfigError::Contract(_))
        ));
        assert!(matches!(
            config.reload(&mut Hero::default()),
            Err(ConfigError::Contract(_))
        ));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let cache = fixture(&[]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());

        let loaded = config.load(&mut hero, "nope.ini", None);
        assert!(!loaded.found);
        assert!(config.is_loaded());
        assert_eq!(config.initialize(&mut hero).unwrap(), InitReport::default());
    }

    #[test]
    fn test_missing_setter_and_bad_value() {
        let cache = fixture(&[("hero.ini", "[Configuration]\nspeed: fast\nmood: 'calm'\n")]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());
        config.load(&mut hero, "hero.ini", None);

        let report = config.initialize(&mut hero).unwrap();
        assert_eq!(report.rejected, vec!["speed"]);
        assert_eq!(report.missing, vec!["mood"]);
        assert_eq!(hero.speed, 0.0);
        assert!(hero.extra.is_empty());
    }

    #[test]
    fn test_auto_configure_fills_attributes() {
        let cache = fixture(&[("hero.ini", "[Configuration]\nmood: 'calm'\n")]);
        let mut hero = Hero::default();
        let options = ConfigOptions::default().with_auto_configure(true);
        let mut config = Configurable::<Hero>::new(cache, options);
        config.load(&mut hero, "hero.ini", None);

        let report = config.initialize(&mut hero).unwrap();
        assert_eq!(report.auto_assigned, vec!["mood"]);
        assert_eq!(hero.extra.get("mood"), Some(&Value::from("calm")));
    }

    #[test]
    fn test_section_loaders() {
        let cache = fixture(&[(
            "hero.ini",
            "[Configuration]\n[AnimationStates]\nwalk: 'walk.egg'\nrun: 'run.egg'\n[Sounds]\nhit: 'hit.wav'\n",
        )]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());

        let report = config.load(&mut hero, "hero.ini", None);
        assert_eq!(report.loaded_sections, vec!["AnimationStates"]);
        assert_eq!(report.unhandled_sections, vec!["Sounds"]);
        assert_eq!(hero.states, vec!["walk", "run"]);
    }

    #[test]
    fn test_pop_and_get() {
        let cache = fixture(&[("hero.ini", "[Configuration]\nspeed: 2\nskipExport: true\n")]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());
        config.load(&mut hero, "hero.ini", None);

        assert_eq!(config.get_as::<f64>("speed").unwrap(), 2.0);
        assert_eq!(config.get_or("absent", Value::Int(1)), Value::Int(1));
        assert!(config.pop_as::<bool>("skipExport").unwrap());
        assert!(matches!(config.pop_as::<bool>("skipExport"), Err(ConfigError::MissingKey(_))));
        assert!(!config.pop_as_or("skipExport", false).unwrap());
        assert_eq!(config.get_call("speed", |v| v.to_string()).unwrap(), "2");
        assert_eq!(config.pop_call("speed", |v| v.as_int()).unwrap(), Some(2));
        assert!(config.configuration().is_empty());
    }

    #[test]
    fn test_alternate_main_section() {
        let cache = fixture(&[("hero.ini", "[Configuration]\nspeed: 1\n[Boss]\nspeed: 9\n")]);
        let mut hero = Hero::default();
        let mut config = Configurable::<Hero>::new(cache, ConfigOptions::default());
        config.load(&mut hero, "hero.ini", Some("Boss"));
        config.initialize(&mut hero).unwrap();

        assert_eq!(config.section(), "Boss");
        assert_eq!(hero.speed, 9.0);
    }
}
