use crate::adapters::{JsonFileStore, MemoryStore};
use crate::config::TomlConfig;
use crate::core::aggregator::ResourceAggregator;
use crate::core::designer::DesignerService;
use crate::core::evaluator::SpecEvaluator;
use crate::domain::model::CatalogBundle;
use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Store selected by `[store] backend`.
#[derive(Debug)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl ConfiguredStore {
    pub fn from_config(config: &TomlConfig) -> Self {
        if config.is_file_backend() {
            tracing::info!("💾 Using file store at {}", config.store_path());
            ConfiguredStore::File(JsonFileStore::new(config.store_path()))
        } else {
            tracing::info!("💾 Using in-memory store");
            ConfiguredStore::Memory(MemoryStore::new())
        }
    }

    fn inner(&self) -> &dyn DocumentStore {
        match self {
            ConfiguredStore::Memory(store) => store,
            ConfiguredStore::File(store) => store,
        }
    }
}

#[async_trait]
impl DocumentStore for ConfiguredStore {
    async fn insert(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        self.inner().insert(collection, id, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.inner().get(collection, id).await
    }

    async fn replace(&self, collection: Collection, id: &str, document: Value) -> Result<bool> {
        self.inner().replace(collection, id, document).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        self.inner().delete(collection, id).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>> {
        self.inner().list(collection).await
    }

    async fn clear(&self, collection: Collection) -> Result<usize> {
        self.inner().clear(collection).await
    }
}

pub async fn load_bundle<P: AsRef<Path>>(path: P) -> Result<CatalogBundle> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    serde_json::from_slice(&data).map_err(|e| {
        DesignerError::invalid_record(
            "catalog bundle",
            format!("{} is not a valid bundle: {}", path.display(), e),
        )
    })
}

/// Opens the configured store and, when it holds no modules yet, imports
/// the seed bundle named in `[catalog] seed_file`.
pub async fn build_service(config: &TomlConfig) -> Result<DesignerService<ConfiguredStore>> {
    let store = ConfiguredStore::from_config(config);
    let evaluator = SpecEvaluator::new(ResourceAggregator::from_config(config));
    let service = DesignerService::new(store, evaluator).await?;

    if let Some(seed) = config.seed_file() {
        if service.module_count() == 0 {
            let bundle = load_bundle(seed).await?;
            let summary = service.import_bundle(bundle).await?;
            tracing::info!(
                "🌱 Seeded catalog from {}: {} modules, {} styles, {} specs",
                seed,
                summary.modules,
                summary.styles,
                summary.specs
            );
        } else {
            tracing::debug!("Catalog already populated, skipping seed file {}", seed);
        }
    }

    Ok(service)
}
