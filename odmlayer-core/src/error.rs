//! Error types and result types for mapper operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`]. Schema
//! violations are reported through the dedicated [`ValidationError`] type, which is
//! wrapped by [`DocumentStoreError::Validation`] when it crosses a collection or
//! document boundary.

use bson::{Bson, error::Error as BsonError};
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::schema::FieldType;

/// Represents all possible errors that can occur when working with collections and documents.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between record formats (BSON, JSON, serde types).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A constructor received malformed input (collection name, schema definition).
    ///
    /// Raised synchronously, before any backend call is issued.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A candidate record failed schema validation. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// An error reported by the underlying storage backend, carried unchanged.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for mapper operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// A schema rule rejected a candidate record.
///
/// Each variant names the offending field so callers can surface it directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field had no value and no default.
    #[error("Field \"{field}\" is required")]
    MissingField {
        field: String,
    },
    /// A field's value does not carry the declared type tag.
    #[error("Field \"{field}\" should be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },
    /// A unique field's value is already held by another record in the collection.
    #[error("Field \"{field}\" must be unique. {value} already exists")]
    NotUnique {
        field: String,
        value: Bson,
    },
}

impl ValidationError {
    /// Returns the name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::NotUnique { field, .. } => field,
        }
    }
}

impl DocumentStoreError {
    /// Returns the validation failure if this error is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DocumentStoreError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
