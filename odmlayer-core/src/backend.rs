//! Storage backend abstraction for the mapper.
//!
//! The mapper never stores, indexes or replicates anything itself. Every read and write is
//! delegated to a [`StoreBackend`], which only needs five record-level operations:
//! insert, point lookup, equality query, full replacement by id and delete by id.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating and configuring backend instances
//!
//! # Examples
//!
//! ```ignore
//! use odmlayer::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = backend.insert_document(doc! { "name": "Alice" }, "users").await?;
//! let stored = backend.get_document(id, "users").await?;
//! assert_eq!(stored, Some(doc! { "name": "Alice" }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Uuid;
use std::fmt::Debug;

use crate::{document::Record, error::DocumentStoreResult, query::Query};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe. The mapper adds no locking of its own, so
/// whatever consistency a backend offers for concurrent writes is what callers get.
///
/// # Error Handling
///
/// Backend failures (network, permission, quota) should be reported as
/// [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend). The mapper
/// hands them to its caller unchanged and never retries.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a record into a collection and returns the identifier the backend assigned.
    ///
    /// The collection is created if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `record` - The record to store. It never contains the identifier.
    /// * `collection` - The name of the collection to insert into
    async fn insert_document(&self, record: Record, collection: &str) -> DocumentStoreResult<Uuid>;

    /// Looks up a record by identifier.
    ///
    /// Returns `Ok(None)` if no record with that identifier exists, including when the
    /// collection itself does not exist.
    async fn get_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Record>>;

    /// Returns every record matching all of the query's equality predicates, with its identifier.
    ///
    /// An empty result is not an error. Results come back in the backend's natural order.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`Query`] whose predicates a record must satisfy
    /// * `collection` - The name of the collection to query
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<(Uuid, Record)>>;

    /// Replaces a stored record entirely.
    ///
    /// Fields absent from `record` are removed from the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if no record with that identifier exists.
    async fn update_document(
        &self,
        id: Uuid,
        record: Record,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Deletes a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if no record with that identifier exists.
    async fn delete_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, record: Record, collection: &str) -> DocumentStoreResult<Uuid> {
        (*self)
            .insert_document(record, collection)
            .await
    }

    async fn get_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Record>> {
        (*self)
            .get_document(id, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<(Uuid, Record)>> {
        (*self)
            .query_documents(query, collection)
            .await
    }

    async fn update_document(
        &self,
        id: Uuid,
        record: Record,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .update_document(id, record, collection)
            .await
    }

    async fn delete_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<()> {
        (*self)
            .delete_document(id, collection)
            .await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections().await
    }
}

/// Factory for backends. Builders carry a backend's configuration (connection strings,
/// database names) and perform any asynchronous setup.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
