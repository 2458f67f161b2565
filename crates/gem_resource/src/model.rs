//! Model and texture resources
//!
//! Both read a `[Model]` section of `part: source [-option(value)]*` lines.
//! Each line becomes one export chain ending in a compressed binary model:
//!
//! ```text
//! ModelResource:    Export -> Egg2Bam -> Bam2Pz
//! TextureResource:  TextureCards -> Egg2Bam -> Bam2Pz [, Png2Ico]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gem_cast::Value;
use gem_config::{ConfigBindings, ConfigCache, ConfigOptions, ConfigTarget, Configurable, SectionData};
use indexmap::IndexMap;

use crate::converter::{EXPORT, PNG2ICO, TEXTURE_CARDS};
use crate::error::Result;
use crate::export::{ExportOptions, ExportStep};
use crate::resource::{Resource, ResourceState};

/// `part -> export line` from a `[Model]` section
pub type ModelData = IndexMap<String, String>;

fn model_data(data: &SectionData) -> ModelData {
    data.iter()
        .map(|(part, value)| {
            let line = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (part.clone(), line)
        })
        .collect()
}

fn texture_options(generate_txo: bool, generate_mipmaps: bool) -> ExportOptions {
    let mut options = ExportOptions::new();
    if generate_txo {
        options.insert("-txo".to_string(), Value::from(""));
    }
    if generate_mipmaps {
        options.insert("-mipmaps".to_string(), Value::from(""));
    }
    options
}

fn parse_step(part: &str, line: &str, converter: &str, dir: &Path) -> Option<ExportStep> {
    match ExportStep::parse(part, line, converter) {
        Ok(mut step) => {
            step.relocate(dir);
            Some(step)
        }
        Err(e) => {
            log::error!("Dropping export step '{}': {}", part, e);
            None
        }
    }
}

/// Read `skipExport`, then apply the remaining keys
fn configure_target<T: ConfigTarget>(
    config: &mut Configurable<T>,
    target: &mut T,
    state: &mut ResourceState,
) -> Result<()> {
    let path = state.config_path().to_path_buf();
    config.load(target, &path, None);

    let skip = config.pop_as_or("skipExport", false).unwrap_or_else(|e| {
        log::warn!("{}", e);
        false
    });
    state.set_skip_export(skip);

    config.initialize(target)?;
    Ok(())
}

/// Settings of a [`ModelResource`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSettings {
    pub generate_txo: bool,
    pub generate_mipmaps: bool,
    pub model_data: ModelData,
}

impl ModelSettings {
    pub fn texture_options(&self) -> ExportOptions {
        texture_options(self.generate_txo, self.generate_mipmaps)
    }
}

impl ConfigTarget for ModelSettings {
    fn bindings() -> ConfigBindings<Self> {
        ConfigBindings::new()
            .setter("generateTxo", |s: &mut ModelSettings, v: bool| s.generate_txo = v)
            .setter("generateMipmaps", |s: &mut ModelSettings, v: bool| s.generate_mipmaps = v)
            .section("Model", |s: &mut ModelSettings, data: &SectionData| {
                s.model_data = model_data(data);
            })
    }
}

/// A static model exported from a modeling package
pub struct ModelResource {
    state: ResourceState,
    settings: ModelSettings,
    config: Configurable<ModelSettings>,
}

impl ModelResource {
    /// A resource that has not read its config file yet
    pub fn new(config_path: impl Into<PathBuf>, cache: Arc<dyn ConfigCache>, options: ConfigOptions) -> Self {
        Self {
            state: ResourceState::new(config_path),
            settings: ModelSettings::default(),
            config: Configurable::new(cache, options),
        }
    }

    /// Create and configure
    pub fn open(config_path: impl Into<PathBuf>, cache: Arc<dyn ConfigCache>, options: ConfigOptions) -> Result<Self> {
        let mut resource = Self::new(config_path, cache, options);
        resource.configure()?;
        Ok(resource)
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn models(&self) -> &[String] {
        self.state.models()
    }
}

impl Resource for ModelResource {
    fn state(&self) -> &ResourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }

    fn configure(&mut self) -> Result<()> {
        self.settings = ModelSettings::default();
        configure_target(&mut self.config, &mut self.settings, &mut self.state)
    }

    fn build_export_steps(&mut self) {
        let dir = self.state.base_dir().to_path_buf();
        let options = self.settings.texture_options();

        for (part, line) in &self.settings.model_data {
            let Some(mut export) = parse_step(part, line, EXPORT, &dir) else {
                continue;
            };
            export.set_option("-keep-uvs", "");
            let (binary, compress) = export.generate_post_egg2bampz(Some(&options));

            self.state.add_export_step(export);
            self.state.extend_export_steps([binary, compress]);
            self.state.mark_model();
        }
    }
}

/// Settings of a [`TextureResource`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureSettings {
    pub generate_txo: bool,
    pub generate_mipmaps: bool,
    pub generate_ico: bool,
    pub model_data: ModelData,
}

impl ConfigTarget for TextureSettings {
    fn bindings() -> ConfigBindings<Self> {
        ConfigBindings::new()
            .setter("generateTxo", |s: &mut TextureSettings, v: bool| s.generate_txo = v)
            .setter("generateMipmaps", |s: &mut TextureSettings, v: bool| s.generate_mipmaps = v)
            .setter("generateIco", |s: &mut TextureSettings, v: bool| s.generate_ico = v)
            .section("Model", |s: &mut TextureSettings, data: &SectionData| {
                s.model_data = model_data(data);
            })
    }
}

/// Images turned into textured card models, optionally with an icon
pub struct TextureResource {
    state: ResourceState,
    settings: TextureSettings,
    config: Configurable<TextureSettings>,
}

impl TextureResource {
    pub fn new(config_path: impl Into<PathBuf>, cache: Arc<dyn ConfigCache>, options: ConfigOptions) -> Self {
        Self {
            state: ResourceState::new(config_path),
            settings: TextureSettings::default(),
            config: Configurable::new(cache, options),
        }
    }

    pub fn open(config_path: impl Into<PathBuf>, cache: Arc<dyn ConfigCache>, options: ConfigOptions) -> Result<Self> {
        let mut resource = Self::new(config_path, cache, options);
        resource.configure()?;
        Ok(resource)
    }

    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    pub fn models(&self) -> &[String] {
        self.state.models()
    }
}

impl Resource for TextureResource {
    fn state(&self) -> &ResourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }

    fn configure(&mut self) -> Result<()> {
        self.settings = TextureSettings::default();
        configure_target(&mut self.config, &mut self.settings, &mut self.state)
    }

    fn build_export_steps(&mut self) {
        let dir = self.state.base_dir().to_path_buf();
        let options = texture_options(self.settings.generate_txo, self.settings.generate_mipmaps);

        for (part, line) in &self.settings.model_data {
            let Some(cards) = parse_step(part, line, TEXTURE_CARDS, &dir) else {
                continue;
            };
            let (binary, compress) = cards.generate_post_egg2bampz(Some(&options));

            self.state.add_export_step(cards);
            self.state.extend_export_steps([binary, compress]);
            self.state.mark_model();

            if self.settings.generate_ico {
                if let Some(icon) = parse_step(part, line, PNG2ICO, &dir) {
                    self.state.add_export_step(icon);
                }
            }
        }
    }
}
