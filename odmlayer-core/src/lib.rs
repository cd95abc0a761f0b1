//! A schema-validating document mapper that sits on top of a schemaless document store.
//!
//! This crate is the core of the odmlayer project and provides:
//!
//! - **Schemas** ([`schema`]) - Field rules, defaults, and the validation engine
//! - **Collections** ([`collection`]) - Create, find, update and delete records through a schema
//! - **Documents** ([`document`]) - Live handles to persisted records with buffered mutation
//! - **Store backend abstraction** ([`backend`]) - The interface a document store must provide
//! - **Queries** ([`query`]) - Equality predicates built from query maps
//! - **Batch reports** ([`batch`]) - Per-record outcomes of multi-record writes
//! - **Document store** ([`store`]) - Owns a backend and hands out collections
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use odmlayer::prelude::*;
//! use odmlayer::memory::InMemoryStore;
//! use bson::doc;
//!
//! let schema = Schema::builder()
//!     .field("id", FieldRule::text().required())
//!     .field("email", FieldRule::text().required().unique())
//!     .field("grades", FieldRule::list().default(Bson::Array(vec![])))
//!     .build()?;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let students = store.collection("students", schema)?;
//!
//! let mut student = students
//!     .create_one(doc! { "id": "01234", "email": "a@x.com" })
//!     .await?;
//!
//! student.set("grades", vec![90, 92, 93]);
//! student.save().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as odmlayer_core;

pub mod backend;
pub mod batch;
pub mod collection;
pub mod document;
pub mod error;
pub mod query;
pub mod schema;
pub mod store;
