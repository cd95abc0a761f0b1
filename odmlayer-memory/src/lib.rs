//! In-memory document storage backend for odmlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Deterministic order** - Queries return records in insertion order
//! - **Equality queries** - Numbers compare by value across integer and float types
//!
//! # Quick Start
//!
//! ```ignore
//! use odmlayer::prelude::*;
//! use odmlayer::memory::InMemoryStore;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!
//!     let schema = Schema::builder()
//!         .field("name", FieldRule::text().required())
//!         .build()?;
//!     let users = store.collection("users", schema)?;
//!
//!     users.create_one(doc! { "name": "Alice" }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as odmlayer_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
