//! # gem_resource - Gemstone Resource Export
//!
//! Describes how source assets become engine-ready files and runs only the
//! conversions that are out of date:
//! - **Export steps**: `source [-option(value)]*` config lines and the
//!   follow-up steps chained onto them
//! - **Converters**: the tool table (`maya2egg`, `egg2bam`, `pzip`, ...) and
//!   the [`ConverterInvoker`] seam that actually runs a tool
//! - **Planning**: chain partitioning and modification-date staleness checks
//! - **Resources**: config-driven [`ModelResource`] / [`TextureResource`]
//!   and the [`ResourceManager`] that owns them

pub mod chain;
pub mod converter;
pub mod error;
pub mod export;
pub mod manager;
pub mod model;
pub mod resource;

pub use chain::{execute_plan, partition, plan_export, ExportPlan};
pub use converter::{
    ArgumentStyle, Converter, ConverterInvoker, ConverterRegistry, DryRunInvoker, Invocation,
    Platform, ProcessInvoker, BAM2PZ, EGG2BAM, EXPORT, MAKE_FONT, OPT_CHAR, PNG2ICO, TEXTURE_CARDS,
};
pub use error::{ExportError, Result};
pub use export::{ExportOptions, ExportStep};
pub use manager::{ResourceId, ResourceManager};
pub use model::{ModelData, ModelResource, ModelSettings, TextureResource, TextureSettings};
pub use resource::{ExportEnv, Resource, ResourceState};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::converter::{ConverterInvoker, ConverterRegistry};
    pub use crate::error::{ExportError, Result};
    pub use crate::export::ExportStep;
    pub use crate::manager::ResourceManager;
    pub use crate::model::{ModelResource, TextureResource};
    pub use crate::resource::Resource;
}
