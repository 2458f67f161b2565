//! # gem_core - Gemstone Core
//!
//! Small, dependency-light helpers shared by every Gemstone crate:
//! - **Naming**: the snake/camel case rules used to map config keys and
//!   section names onto setters and section loaders
//! - **File dates**: modification-time queries used by config caches and
//!   export planning
//! - **Settings**: the framework's runtime flags, loaded from TOML and the
//!   environment and passed around explicitly

pub mod error;
pub mod file_system;
pub mod naming;
pub mod settings;

pub use error::{CoreError, Result};
pub use file_system::{absolute_path, file_date, is_newer, FileClock, OsFileClock};
pub use naming::{camel_case, loader_name, setter_name, snake_case};
pub use settings::Settings;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::file_system::{absolute_path, file_date, is_newer, FileClock, OsFileClock};
    pub use crate::naming::{camel_case, snake_case};
    pub use crate::settings::Settings;
}
