pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::TomlConfig;

pub use adapters::{JsonFileStore, MemoryStore};
pub use core::designer::{DesignerService, PlacementRequest};
pub use core::evaluator::{LayoutVerdict, SpecEvaluator};
pub use utils::error::{DesignerError, Result};
