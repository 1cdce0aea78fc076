use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Keeps each collection as one JSON object (`id -> document`) in
/// `<base_path>/<collection>.json`. Writes go to a temporary file that is
/// renamed over the old one, so readers see either the old or the new file.
#[derive(Debug)]
pub struct JsonFileStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.base_path.join(format!("{}.json", collection.as_str()))
    }

    async fn read_collection(&self, collection: Collection) -> Result<BTreeMap<String, Value>> {
        let path = self.collection_path(collection);
        match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                DesignerError::storage(format!("corrupt collection file {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_collection(
        &self,
        collection: Collection,
        documents: &BTreeMap<String, Value>,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(documents)?;

        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(
            "Wrote {} documents ({} bytes) to {}",
            documents.len(),
            data.len(),
            path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_collection(collection).await?;
        if documents.contains_key(id) {
            return Err(DesignerError::storage(format!(
                "duplicate id {} in {}",
                id, collection
            )));
        }
        documents.insert(id.to_string(), document);
        self.write_collection(collection, &documents).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self.read_collection(collection).await?.remove(id))
    }

    async fn replace(&self, collection: Collection, id: &str, document: Value) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_collection(collection).await?;
        match documents.get_mut(id) {
            Some(existing) => *existing = document,
            None => return Ok(false),
        }
        self.write_collection(collection, &documents).await?;
        Ok(true)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_collection(collection).await?;
        if documents.remove(id).is_none() {
            return Ok(false);
        }
        self.write_collection(collection, &documents).await?;
        Ok(true)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>> {
        Ok(self.read_collection(collection).await?.into_iter().collect())
    }

    async fn clear(&self, collection: Collection) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let documents = self.read_collection(collection).await?;
        let count = documents.len();
        self.write_collection(collection, &BTreeMap::new()).await?;
        Ok(count)
    }
}
