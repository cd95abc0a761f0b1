//! Collections: a schema bound to a named backend collection.
//!
//! A [`Collection`] is the only way records get written. Every create and update goes
//! through the collection's [`Schema`] first, and every record read back is wrapped in a
//! live [`Document`].
//!
//! Operations that match records by query map return `Ok(None)` when nothing matches.
//! A missing record is not an error.
//!
//! # Example
//!
//! ```ignore
//! use odmlayer::prelude::*;
//! use bson::doc;
//!
//! let students = Collection::new(&backend, "students", schema)?;
//!
//! students.create_one(doc! { "id": "1", "email": "a@x.com" }).await?;
//!
//! let updated = students
//!     .update_one(doc! { "id": "1" }, doc! { "grades": [90, 92, 93] })
//!     .await?;
//! assert!(updated.is_some());
//!
//! assert!(students.find(doc! { "id": "2" }).await?.is_none());
//! ```

use async_trait::async_trait;
use bson::{Bson, Uuid};
use serde::Serialize;

use crate::{
    backend::StoreBackend,
    batch::BatchReport,
    document::{Document, Record, RecordExt},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
    schema::{Schema, UniqueProbe, UniqueScope},
};

/// A named collection of records that all conform to one [`Schema`].
///
/// # Type Parameters
///
/// * `B` - The storage backend. Pass a reference (`&B`) to share one backend between
///   several collections.
#[derive(Debug)]
pub struct Collection<B: StoreBackend> {
    name: String,
    schema: Schema,
    backend: B,
}

impl<B: StoreBackend> Collection<B> {
    /// Binds `schema` to the backend collection called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] if the name is empty, only
    /// whitespace, or contains `/` or a NUL character. No backend call is made.
    pub fn new(backend: B, name: impl Into<String>, schema: Schema) -> DocumentStoreResult<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DocumentStoreError::InvalidArgument(
                "collection name must be a non-empty string".to_string(),
            ));
        }

        if name.contains(['/', '\0']) {
            return Err(DocumentStoreError::InvalidArgument(format!(
                "collection name {name:?} must not contain '/' or NUL"
            )));
        }

        Ok(Self { name, schema, backend })
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema every record in this collection is validated against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the backend this collection reads and writes through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validates `data`, inserts it and returns the record as the backend stored it.
    ///
    /// Fields not declared by the schema are dropped. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a validation error (and inserts nothing) if `data` breaks the schema,
    /// or the backend's error if the insert or the read back fails.
    pub async fn create_one(&self, data: Record) -> DocumentStoreResult<Document<'_, B>> {
        let scope = UniqueScope::new(self);
        let validated = self
            .schema
            .validate(&data, Some(&scope))
            .await?;

        let id = self
            .backend
            .insert_document(validated, &self.name)
            .await?;

        tracing::debug!(collection = %self.name, id = %id, "created document");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), self.name.clone()))
    }

    /// Serializes `value` and creates a record from it.
    ///
    /// See [`create_one`](Self::create_one).
    pub async fn create_from<T: Serialize>(&self, value: &T) -> DocumentStoreResult<Document<'_, B>> {
        self.create_one(Record::from_serialize(value)?)
            .await
    }

    /// Returns every record where each field of `query` equals its value.
    ///
    /// Returns `Ok(None)` when nothing matches, otherwise a non-empty list in the
    /// backend's order.
    pub async fn find(&self, query: impl Into<Query>) -> DocumentStoreResult<Option<Vec<Document<'_, B>>>> {
        let query = query.into();

        tracing::trace!(collection = %self.name, predicates = query.predicates.len(), "querying documents");

        let documents = self
            .backend
            .query_documents(query, &self.name)
            .await?
            .into_iter()
            .map(|(id, fields)| Document::new(self, id, fields))
            .collect::<Vec<_>>();

        Ok((!documents.is_empty()).then_some(documents))
    }

    /// Returns the first record [`find`](Self::find) would return.
    pub async fn find_one(&self, query: impl Into<Query>) -> DocumentStoreResult<Option<Document<'_, B>>> {
        Ok(self
            .find(query)
            .await?
            .and_then(|documents| documents.into_iter().next()))
    }

    /// Returns every record in the collection, or `Ok(None)` if it is empty.
    pub async fn get(&self) -> DocumentStoreResult<Option<Vec<Document<'_, B>>>> {
        self.find(Query::new()).await
    }

    /// Looks up a record by its identifier.
    pub async fn get_by_id(&self, id: Uuid) -> DocumentStoreResult<Option<Document<'_, B>>> {
        Ok(self
            .backend
            .get_document(id, &self.name)
            .await?
            .map(|fields| Document::new(self, id, fields)))
    }

    /// Applies `patch` to the first record matching `query`.
    ///
    /// The patch is merged over the stored fields, patch values winning, and the merged
    /// record is validated and written as a whole. Returns the record as re-read from the
    /// backend, or `Ok(None)` if nothing matched. If the re-read fails after the write went
    /// through, the document holds the fields that were saved.
    ///
    /// # Errors
    ///
    /// Returns a validation error (and writes nothing) if the merged record breaks the schema.
    pub async fn update_one(
        &self,
        query: impl Into<Query>,
        patch: Record,
    ) -> DocumentStoreResult<Option<Document<'_, B>>> {
        let Some(document) = self.find_one(query).await? else {
            return Ok(None);
        };

        self.apply_patch(document, patch)
            .await
            .map(Some)
    }

    /// Applies `patch` to every record matching `query`, one record at a time.
    ///
    /// Each record is merged, validated and written on its own. A record that fails does
    /// not stop the rest, and records already written stay written. Returns `Ok(None)` if
    /// nothing matched.
    ///
    /// # Errors
    ///
    /// Only the initial query can fail the whole call. Per-record failures are reported
    /// in the [`BatchReport`].
    pub async fn update_all(
        &self,
        query: impl Into<Query>,
        patch: Record,
    ) -> DocumentStoreResult<Option<BatchReport<Document<'_, B>>>> {
        let Some(documents) = self.find(query).await? else {
            return Ok(None);
        };

        let mut report = BatchReport::new();

        for document in documents {
            let id = document.id().to_owned();
            let outcome = self
                .apply_patch(document, patch.clone())
                .await;

            if let Err(err) = &outcome {
                tracing::warn!(collection = %self.name, id = %id, error = %err, "update failed, continuing");
            }

            report.push(id, outcome);
        }

        Ok(Some(report))
    }

    /// Deletes the first record matching `query` and returns its identifier, or `Ok(None)`
    /// if nothing matched.
    pub async fn delete_one(&self, query: impl Into<Query>) -> DocumentStoreResult<Option<Uuid>> {
        let Some(mut document) = self.find_one(query).await? else {
            return Ok(None);
        };

        document.delete().await?;

        Ok(Some(document.id().to_owned()))
    }

    /// Deletes every record matching `query`, one record at a time.
    ///
    /// A failed delete does not stop the rest. Returns `Ok(None)` if nothing matched.
    pub async fn delete_all(&self, query: impl Into<Query>) -> DocumentStoreResult<Option<BatchReport<Uuid>>> {
        let Some(documents) = self.find(query).await? else {
            return Ok(None);
        };

        let mut report = BatchReport::new();

        for mut document in documents {
            let id = document.id().to_owned();
            let outcome = document.delete().await.map(|_| id);

            if let Err(err) = &outcome {
                tracing::warn!(collection = %self.name, id = %id, error = %err, "delete failed, continuing");
            }

            report.push(id, outcome);
        }

        Ok(Some(report))
    }

    async fn apply_patch<'c>(
        &'c self,
        mut document: Document<'c, B>,
        patch: Record,
    ) -> DocumentStoreResult<Document<'c, B>> {
        document.merge(patch);
        document.save().await?;

        // The write is committed; a failed re-read leaves the saved fields in place.
        if let Err(err) = document.refresh().await {
            tracing::warn!(collection = %self.name, id = %document.id(), error = %err, "re-read after update failed");
        }

        Ok(document)
    }
}

#[async_trait]
impl<B: StoreBackend> UniqueProbe for Collection<B> {
    async fn is_taken(
        &self,
        field: &str,
        value: &Bson,
        exclude: Option<Uuid>,
    ) -> DocumentStoreResult<bool> {
        let query = Query::builder()
            .eq(field, value.clone())
            .build();

        Ok(self
            .backend
            .query_documents(query, &self.name)
            .await?
            .iter()
            .any(|(id, _)| Some(*id) != exclude))
    }
}
