pub mod bootstrap;
#[cfg(feature = "cli")]
pub mod commands;

pub use bootstrap::{build_service, load_bundle, ConfiguredStore};
