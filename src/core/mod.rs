pub mod aggregator;
pub mod catalog;
pub mod designer;
pub mod documents;
pub mod evaluator;
pub mod layout;

pub use crate::domain::model::{
    Datacenter, DatacenterSpec, DatacenterStyle, Module, PlacedModule, Rotation,
};
pub use crate::domain::ports::{Collection, ConfigProvider, DocumentStore};
pub use crate::utils::error::Result;
