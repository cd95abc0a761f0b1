//! Main odmlayer crate providing a schema-validating document mapper.
//!
//! This crate is the primary entry point for users of odmlayer. It re-exports the core
//! types from the sub-crates and provides access to the storage backends.
//!
//! # Features
//!
//! - **Schemas** - Declare field types, required fields, defaults and unique fields
//! - **Validated writes** - Every create, update and save is checked against the schema
//! - **Live documents** - Mutate fields locally, then save or delete the whole record
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use odmlayer::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!
//!     let schema = Schema::builder()
//!         .field("id", FieldRule::text().required().unique())
//!         .field("email", FieldRule::text().required().unique())
//!         .field("grades", FieldRule::list().default(Bson::Array(vec![])))
//!         .field("enrolled", FieldRule::timestamp().default_with(FieldDefault::now()))
//!         .build()?;
//!
//!     let students = store.collection("students", schema)?;
//!
//!     // Validated, defaulted and inserted
//!     students
//!         .create_one(doc! { "id": "1", "email": "a@x.com" })
//!         .await?;
//!
//!     // Merged over the stored fields and validated again
//!     students
//!         .update_one(doc! { "id": "1" }, doc! { "grades": [90, 92, 93] })
//!         .await?;
//!
//!     // Buffered locally until save
//!     if let Some(mut student) = students.find_one(doc! { "id": "1" }).await? {
//!         student.set("email", "b@x.com");
//!         student.save().await?;
//!         student.delete().await?;
//!     }
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use odmlayer_core::{backend, batch, collection, document, error, query, schema, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use odmlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use odmlayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
