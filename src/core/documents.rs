use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn to_document<T: Serialize>(record: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(record)?)
}

pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    id: &str,
    document: serde_json::Value,
) -> Result<T> {
    serde_json::from_value(document).map_err(|e| {
        DesignerError::storage(format!(
            "document {} in {} does not match its schema: {}",
            id, collection, e
        ))
    })
}

pub async fn fetch<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<Option<T>> {
    match store.get(collection, id).await? {
        Some(document) => Ok(Some(from_document(collection, id, document)?)),
        None => Ok(None),
    }
}

pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> Result<Vec<T>> {
    store
        .list(collection)
        .await?
        .into_iter()
        .map(|(id, document)| from_document(collection, &id, document))
        .collect()
}
