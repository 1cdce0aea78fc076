use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Modules,
    DatacenterStyles,
    DatacenterSpecs,
    Datacenters,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Modules,
        Collection::DatacenterStyles,
        Collection::DatacenterSpecs,
        Collection::Datacenters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Modules => "modules",
            Collection::DatacenterStyles => "datacenter_styles",
            Collection::DatacenterSpecs => "datacenter_specs",
            Collection::Datacenters => "datacenters",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value document store. Every call completes or fails as a whole;
/// identifiers are opaque strings.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fails when `id` already exists in the collection.
    async fn insert(&self, collection: Collection, id: &str, document: Value) -> Result<()>;
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;
    /// Replaces an existing document. Returns `false` when `id` is unknown.
    async fn replace(&self, collection: Collection, id: &str, document: Value) -> Result<bool>;
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;
    /// Full scan, ordered by identifier.
    async fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>>;
    /// Removes every document and returns how many were dropped.
    async fn clear(&self, collection: Collection) -> Result<usize>;
}

pub trait ConfigProvider: Send + Sync {
    fn power_unit(&self) -> &str;
    fn water_unit(&self) -> &str;
}
