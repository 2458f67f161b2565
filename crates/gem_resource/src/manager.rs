//! Resource manager
//!
//! Owns the registered resources together with the collaborators they
//! export through, and reloads resources whose config file changed.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use gem_core::{FileClock, OsFileClock, Settings};
use indexmap::IndexMap;

use crate::converter::{ConverterInvoker, ConverterRegistry, ProcessInvoker};
use crate::error::Result;
use crate::resource::{ExportEnv, Resource};

/// Handle to a registered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

pub struct ResourceManager {
    resources: IndexMap<ResourceId, Box<dyn Resource>>,
    next_id: u64,
    skip_export: bool,
    registry: ConverterRegistry,
    clock: Arc<dyn FileClock>,
    invoker: Arc<dyn ConverterInvoker>,
    settings: Settings,
}

impl ResourceManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            resources: IndexMap::new(),
            next_id: 0,
            skip_export: false,
            registry: ConverterRegistry::with_defaults(),
            clock: Arc::new(OsFileClock),
            invoker: Arc::new(ProcessInvoker),
            settings,
        }
    }

    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn FileClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_invoker(mut self, invoker: Arc<dyn ConverterInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn register(&mut self, resource: Box<dyn Resource>) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        log::debug!("Registered {} ({})", id, resource.state().config_path().display());
        self.resources.insert(id, resource);
        id
    }

    pub fn unregister(&mut self, id: ResourceId) -> Option<Box<dyn Resource>> {
        self.resources.shift_remove(&id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&dyn Resource> {
        self.resources.get(&id).map(|resource| &**resource)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut (dyn Resource + 'static)> {
        self.resources.get_mut(&id).map(|resource| &mut **resource)
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Skip exporting for every resource
    pub fn set_skip_export(&mut self, skip: bool) {
        self.skip_export = skip;
    }

    pub fn skip_export(&self) -> bool {
        self.skip_export
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load one resource; `None` if `id` is unknown
    pub fn load(&mut self, id: ResourceId, force_export: bool) -> Option<bool> {
        let env = ExportEnv {
            registry: &self.registry,
            clock: self.clock.as_ref(),
            invoker: self.invoker.as_ref(),
            skip_export: self.skip_export,
        };
        self.resources
            .get_mut(&id)
            .map(|resource| resource.load(&env, force_export))
    }

    /// Load every resource not loaded yet; returns how many were loaded
    pub fn load_all(&mut self, force_export: bool) -> usize {
        let env = ExportEnv {
            registry: &self.registry,
            clock: self.clock.as_ref(),
            invoker: self.invoker.as_ref(),
            skip_export: self.skip_export,
        };
        self.resources
            .values_mut()
            .map(|resource| resource.load(&env, force_export))
            .filter(|&loaded| loaded)
            .count()
    }

    /// Reload every resource; returns the ones that failed
    pub fn reload(&mut self, force_reload: bool, force_export: bool) -> Vec<ResourceId> {
        let env = ExportEnv {
            registry: &self.registry,
            clock: self.clock.as_ref(),
            invoker: self.invoker.as_ref(),
            skip_export: self.skip_export,
        };

        let mut failed = Vec::new();
        for (id, resource) in self.resources.iter_mut() {
            if let Err(e) = resource.reload(&env, force_reload, force_export) {
                log::error!("Failed to reload {}: {}", id, e);
                failed.push(*id);
            }
        }
        failed
    }

    /// Reload the resources configured by `path`. Developer builds only.
    pub fn on_file_changed(&mut self, path: &Path) -> Result<Vec<ResourceId>> {
        self.settings.require_developer("on_file_changed")?;

        let env = ExportEnv {
            registry: &self.registry,
            clock: self.clock.as_ref(),
            invoker: self.invoker.as_ref(),
            skip_export: self.skip_export,
        };

        let mut reloaded = Vec::new();
        for (id, resource) in self.resources.iter_mut() {
            if !resource.supports_reloading() {
                continue;
            }
            match resource.attempt_reload(&env, path) {
                Ok(true) => reloaded.push(*id),
                Ok(false) => {}
                Err(e) => log::error!("Failed to reload {}: {}", id, e),
            }
        }
        Ok(reloaded)
    }
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("resources", &self.resources.len())
            .field("skip_export", &self.skip_export)
            .field("registry", &self.registry)
            .finish()
    }
}
