//! # gem_indented - Gemstone Indented Files
//!
//! Scene description files where indentation gives structure:
//!
//! ```text
//! Group world:
//!     Model hero: models/hero.ini
//!     *Light sun: Vec(1, 1, 1)    # free: not attached to `world`
//! ```
//!
//! - **Parser**: builds an [`IndentedTree`], skipping (and reporting)
//!   lines that do not parse
//! - **Tree**: arena of nodes with parent/child links and depth helpers
//! - **Scene**: replays a tree through a [`NodeRegistry`] of constructors

pub mod error;
pub mod parser;
pub mod scene;
pub mod tree;

pub use error::{IndentedError, Result};
pub use parser::{parse_file, parse_named, parse_str, ParseOptions, Parsed};
pub use scene::{NodeRegistry, Scene, SceneObject};
pub use tree::{IndentedNode, IndentedTree, NodeId};
