//! Resources
//!
//! A resource is an asset described by a config file. Loading it rebuilds
//! its export steps from the configuration, re-runs whatever the staleness
//! plan says is out of date, and records the files the engine should load.

use std::path::{Path, PathBuf};

use gem_core::{absolute_path, FileClock};

use crate::chain::{execute_plan, partition, plan_export};
use crate::converter::{ConverterInvoker, ConverterRegistry};
use crate::error::Result;
use crate::export::ExportStep;

/// Collaborators used while exporting
#[derive(Clone, Copy)]
pub struct ExportEnv<'a> {
    pub registry: &'a ConverterRegistry,
    pub clock: &'a dyn FileClock,
    pub invoker: &'a dyn ConverterInvoker,
    /// Skip exporting for every resource
    pub skip_export: bool,
}

/// Export bookkeeping shared by every resource kind
#[derive(Debug, Clone)]
pub struct ResourceState {
    config_path: PathBuf,
    skip_export: bool,
    loaded: bool,
    export_failed: bool,
    steps: Vec<ExportStep>,
    model_steps: Vec<usize>,
    models: Vec<String>,
}

impl ResourceState {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            skip_export: false,
            loaded: false,
            export_failed: true,
            steps: Vec::new(),
            model_steps: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory relative step file names resolve against
    pub fn base_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn skip_export(&self) -> bool {
        self.skip_export
    }

    pub fn set_skip_export(&mut self, skip: bool) {
        self.skip_export = skip;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn export_failed(&self) -> bool {
        self.export_failed
    }

    pub fn add_export_step(&mut self, step: ExportStep) {
        self.steps.push(step);
    }

    pub fn extend_export_steps(&mut self, steps: impl IntoIterator<Item = ExportStep>) {
        self.steps.extend(steps);
    }

    pub fn get_export_step(&self, index: usize) -> Option<&ExportStep> {
        self.steps.get(index)
    }

    pub fn last_export_step(&self) -> Option<&ExportStep> {
        self.steps.last()
    }

    pub fn export_steps(&self) -> &[ExportStep] {
        &self.steps
    }

    pub fn reset_export_steps(&mut self) {
        self.steps.clear();
        self.model_steps.clear();
        self.models.clear();
    }

    /// Mark the last step's output as a loadable model
    pub fn mark_model(&mut self) {
        if let Some(index) = self.steps.len().checked_sub(1) {
            self.model_steps.push(index);
        }
    }

    /// Files to load once exporting is done
    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn resolve_models(&mut self, registry: &ConverterRegistry) {
        self.models = self
            .model_steps
            .iter()
            .filter_map(|&index| self.steps.get(index))
            .filter_map(|step| registry.output_filename(step))
            .collect();
    }
}

/// An asset driven by a config file
pub trait Resource: Send {
    fn state(&self) -> &ResourceState;

    fn state_mut(&mut self) -> &mut ResourceState;

    /// Read the config file into the resource
    fn configure(&mut self) -> Result<()>;

    /// Append this resource's export steps to its (empty) state
    fn build_export_steps(&mut self);

    fn supports_reloading(&self) -> bool {
        true
    }

    /// Rebuild the export steps and run the stale ones.
    ///
    /// `force_export` runs every step regardless of file dates.
    fn export(&mut self, env: &ExportEnv<'_>, force_export: bool) -> bool {
        self.state_mut().reset_export_steps();
        self.build_export_steps();

        let state = self.state_mut();
        state.resolve_models(env.registry);

        if state.skip_export || env.skip_export {
            log::debug!("Skipping export for {}", state.config_path.display());
            state.export_failed = false;
            return true;
        }

        let reference = env.clock.modified(&state.config_path);
        let mut plan = plan_export(&partition(&state.steps), reference, env.registry, env.clock);
        if force_export {
            plan.forced = true;
            plan.remaining = state.steps.clone();
        }
        if !plan.complete {
            log::warn!(
                "Export plan for {} is incomplete",
                state.config_path.display()
            );
        }

        let success = execute_plan(&plan, env.registry, env.clock, env.invoker);
        state.export_failed = !success;
        success
    }

    /// Export and mark loaded; `false` if already loaded
    fn load(&mut self, env: &ExportEnv<'_>, force_export: bool) -> bool {
        if self.state().loaded {
            return false;
        }
        self.export(env, force_export);
        self.state_mut().loaded = true;
        true
    }

    /// `false` if not loaded
    fn unload(&mut self) -> bool {
        let state = self.state_mut();
        if !state.loaded {
            return false;
        }
        state.loaded = false;
        true
    }

    /// Re-read the config file. With `force_reload` the resource is also
    /// unloaded and loaded again.
    fn reload(&mut self, env: &ExportEnv<'_>, force_reload: bool, force_export: bool) -> Result<()> {
        if force_reload && self.state().loaded {
            self.unload();
        }
        self.configure()?;
        if force_reload {
            self.load(env, force_export);
        }
        Ok(())
    }

    /// Reload if `changed` is this resource's config file
    fn attempt_reload(&mut self, env: &ExportEnv<'_>, changed: &Path) -> Result<bool> {
        if absolute_path(changed) != absolute_path(self.state().config_path()) {
            return Ok(false);
        }
        log::info!("Reloading {}", changed.display());
        self.reload(env, true, false)?;
        Ok(true)
    }
}
