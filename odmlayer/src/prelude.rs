//! Convenient re-exports of commonly used types from odmlayer.
//!
//! ```ignore
//! use odmlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Schemas, field rules and defaults
//! - Collections, documents and batch reports
//! - Store backends and builders
//! - Query construction
//! - Error types

pub use bson::{Bson, Uuid};

pub use odmlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    batch::BatchReport,
    collection::Collection,
    document::{Document, Record, RecordExt},
    error::{DocumentStoreError, DocumentStoreResult, ValidationError},
    query::{Filter, Predicate, Query, QueryBuilder},
    schema::{FieldDefault, FieldRule, FieldType, Schema, SchemaBuilder},
    store::DocumentStore,
};
