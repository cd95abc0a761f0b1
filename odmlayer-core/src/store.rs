//! The document store: an owned backend that hands out collections.
//!
//! # Example
//!
//! ```ignore
//! use odmlayer::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let students = store.collection("students", student_schema)?;
//! let teachers = store.collection("teachers", teacher_schema)?;
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::DocumentStoreResult,
    schema::Schema,
};

/// Owns a storage backend and binds schemas to its collections.
///
/// Collections returned by [`collection`](Self::collection) borrow the store's backend,
/// so any number of them can share one connection.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Binds `schema` to the collection called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`](crate::error::DocumentStoreError::InvalidArgument)
    /// if `name` is not a valid collection name.
    pub fn collection(&self, name: impl Into<String>, schema: Schema) -> DocumentStoreResult<Collection<&B>> {
        Collection::new(&self.backend, name, schema)
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Shuts down the underlying backend.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}
