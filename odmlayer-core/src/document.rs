//! Records and live documents.
//!
//! A [`Record`] is the unit of storage: an ordered map from field name to BSON value.
//! A [`Document`] is one persisted record pulled into memory, together with its
//! backend-assigned identifier and a reference back to the [`Collection`] it came from.
//!
//! Documents buffer changes locally. [`Document::set`] never validates; the whole record
//! is validated again when [`Document::save`] pushes it back to the backend.
//!
//! # Lifecycle
//!
//! A document is either live or deleted. [`Document::delete`] moves it to the deleted
//! state, after which `save` and `delete` do nothing. There is no way back; fetch the
//! record again through the collection to get a live handle.

use bson::{Bson, Uuid, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, to_value};
use std::fmt;

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::DocumentStoreResult,
    schema::UniqueScope,
};

/// An ordered mapping from field name to value.
pub type Record = bson::Document;

/// Conversions between records, serde types and JSON.
///
/// Implemented for [`Record`].
pub trait RecordExt: Sized {
    /// Serializes a value into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or `value` does not serialize to a map.
    fn from_serialize<T: Serialize>(value: &T) -> DocumentStoreResult<Self>;

    /// Deserializes this record into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not have the structure `T` expects.
    fn deserialize_into<T: DeserializeOwned>(self) -> DocumentStoreResult<T>;

    /// Converts this record to a JSON value.
    fn to_json(&self) -> DocumentStoreResult<Value>;

    /// Creates a record from a JSON object.
    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl RecordExt for Record {
    fn from_serialize<T: Serialize>(value: &T) -> DocumentStoreResult<Self> {
        Ok(serialize_to_document(value)?)
    }

    fn deserialize_into<T: DeserializeOwned>(self) -> DocumentStoreResult<T> {
        Ok(deserialize_from_document(self)?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(serialize_to_document(&value)?)
    }
}

/// One persisted record, held in memory.
///
/// The identifier and the deleted flag are kept apart from the record's fields, so a
/// field can never overwrite them. A document borrows the collection it was produced by
/// and cannot outlive it.
pub struct Document<'c, B: StoreBackend> {
    collection: &'c Collection<B>,
    id: Uuid,
    deleted: bool,
    fields: Record,
}

impl<'c, B: StoreBackend> Document<'c, B> {
    pub(crate) fn new(collection: &'c Collection<B>, id: Uuid, fields: Record) -> Self {
        Self {
            collection,
            id,
            deleted: false,
            fields,
        }
    }

    /// Returns the backend-assigned identifier.
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns the collection this document belongs to.
    pub fn collection(&self) -> &'c Collection<B> {
        self.collection
    }

    /// Returns `true` once [`delete`](Self::delete) has removed the record.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the document's current fields, including unsaved changes.
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    /// Reads a field by name.
    pub fn get(&self, field: &str) -> Option<&Bson> {
        self.fields.get(field)
    }

    /// Assigns a field in memory and returns the previous value.
    ///
    /// Nothing is validated or written until [`save`](Self::save) is called, so a
    /// document may be left in an invalid state between several assignments.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field in memory. On the next save the field takes its schema default,
    /// or is dropped from the stored record if it has none.
    pub fn remove(&mut self, field: &str) -> Option<Bson> {
        self.fields.remove(field)
    }

    /// Assigns every field in `patch`, overwriting existing values.
    pub fn merge(&mut self, patch: Record) {
        for (field, value) in patch {
            self.fields.insert(field, value);
        }
    }

    /// Validates the current fields and replaces the stored record with the result.
    ///
    /// Untouched fields keep the values they were fetched with; only fields that are
    /// genuinely missing receive schema defaults. On success the document holds the
    /// validated record. Does nothing if the document has been deleted.
    ///
    /// A write made by someone else between this document's fetch and its save is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns a validation error (and writes nothing) if the fields break the schema,
    /// or the backend's error if the replacement fails.
    pub async fn save(&mut self) -> DocumentStoreResult<()> {
        if self.deleted {
            return Ok(());
        }

        let scope = UniqueScope::new(self.collection).excluding(self.id);
        let validated = self
            .collection
            .schema()
            .validate(&self.fields, Some(&scope))
            .await?;

        self.collection
            .backend()
            .update_document(self.id, validated.clone(), self.collection.name())
            .await?;

        tracing::debug!(collection = %self.collection.name(), id = %self.id, "saved document");

        self.fields = validated;

        Ok(())
    }

    /// Deletes the record from the backend and marks this document as deleted.
    ///
    /// Calling it again is a no-op and issues no backend call.
    pub async fn delete(&mut self) -> DocumentStoreResult<()> {
        if self.deleted {
            return Ok(());
        }

        self.collection
            .backend()
            .delete_document(self.id, self.collection.name())
            .await?;

        tracing::debug!(collection = %self.collection.name(), id = %self.id, "deleted document");

        self.deleted = true;

        Ok(())
    }

    /// Re-reads the record from the backend, discarding unsaved changes.
    ///
    /// If the record no longer exists the document is marked deleted.
    pub async fn refresh(&mut self) -> DocumentStoreResult<()> {
        if self.deleted {
            return Ok(());
        }

        match self
            .collection
            .backend()
            .get_document(self.id, self.collection.name())
            .await?
        {
            Some(fields) => self.fields = fields,
            None => self.deleted = true,
        }

        Ok(())
    }

    /// Consumes the document and returns its fields.
    pub fn into_fields(self) -> Record {
        self.fields
    }

    /// Returns the fields with the identifier added under `_id`.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("_id", self.id);
        for (field, value) in &self.fields {
            record.insert(field.clone(), value.clone());
        }
        record
    }

    /// Deserializes the document's fields into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> DocumentStoreResult<T> {
        self.fields.clone().deserialize_into()
    }

    /// Converts the document, identifier included, to JSON.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        self.to_record().to_json()
    }
}

impl<B: StoreBackend> fmt::Debug for Document<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("collection", &self.collection.name())
            .field("id", &self.id)
            .field("deleted", &self.deleted)
            .field("fields", &self.fields)
            .finish()
    }
}
