//! In-memory storage implementation for document stores.
//!
//! Records live in per-collection vectors kept in insertion order, behind an async-aware
//! read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Uuid;

use odmlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

use crate::evaluator::RecordEvaluator;

type CollectionMap = Vec<(Uuid, Record)>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// Identifiers are random UUIDs assigned on insert. Queries scan the whole collection and
/// return matches in insertion order.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use odmlayer_memory::InMemoryStore;
/// use odmlayer::backend::StoreBackend;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let id = store.insert_document(doc! { "name": "Alice", "age": 30 }, "users").await?;
///     let record = store.get_document(id, "users").await?;
///     assert!(record.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> records in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, record: Record, collection: &str) -> DocumentStoreResult<Uuid> {
        let id = Uuid::new();

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((id, record));

        tracing::trace!(collection, %id, "inserted record");

        Ok(id)
    }

    async fn get_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Record>> {
        let store = self.store.read().await;

        Ok(
            store
                .get(collection)
                .and_then(|records| {
                    records
                        .iter()
                        .find(|(key, _)| *key == id)
                        .map(|(_, record)| record.clone())
                })
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<(Uuid, Record)>> {
        let store = self.store.read().await;
        let records = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let matched = records
            .iter()
            .filter(|(_, record)| RecordEvaluator::new(record).matches(&query))
            .cloned()
            .collect::<Vec<_>>();

        tracing::trace!(collection, matched = matched.len(), "evaluated query");

        Ok(matched)
    }

    async fn update_document(&self, id: Uuid, record: Record, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        let slot = store
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|(key, _)| *key == id))
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        slot.1 = record;

        tracing::trace!(collection, %id, "replaced record");

        Ok(())
    }

    async fn delete_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        let records = store
            .get_mut(collection)
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        let position = records
            .iter()
            .position(|(key, _)| *key == id)
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        records.remove(position);

        tracing::trace!(collection, %id, "removed record");

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use odmlayer_memory::InMemoryStore;
/// use odmlayer::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
