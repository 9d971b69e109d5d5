use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::store::{Document, DocumentRef, DocumentStore, FieldMap, Filter};

/// In-process backend used by tests and local development. Same observable
/// semantics as the hosted backend: generated ids, merge-on-update,
/// delete-is-idempotent.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection; test helper.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|map| map.get(collection).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: &str, filters: &[Filter]) -> AppResult<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| AppError::store("memory store lock poisoned"))?;
        let matches: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filters.iter().all(|f| f.matches(&doc.fields)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(target: "app::store", collection, count = matches.len(), "memory query");
        Ok(matches)
    }

    async fn insert(&self, collection: &str, fields: FieldMap) -> AppResult<Document> {
        let document = Document {
            id: uuid::Uuid::new_v4().to_string(),
            fields,
        };
        let mut collections = self
            .collections
            .write()
            .map_err(|_| AppError::store("memory store lock poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update(&self, doc: &DocumentRef, fields: FieldMap) -> AppResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| AppError::store("memory store lock poisoned"))?;
        let existing = collections
            .get_mut(&doc.collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == doc.id))
            .ok_or_else(AppError::not_found)?;
        for (key, value) in fields {
            existing.fields.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> AppResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| AppError::store("memory store lock poisoned"))?;
        if let Some(docs) = collections.get_mut(&doc.collection) {
            docs.retain(|d| d.id != doc.id);
        }
        Ok(())
    }
}
