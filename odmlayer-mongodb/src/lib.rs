//! MongoDB backend implementation for odmlayer.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Records are stored one MongoDB document per record, keyed by a UUID `_id`, and
//! equality queries run on MongoDB's query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! odmlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Pass the connection string and database name to [`MongoDbStoreBuilder::new`], or set
//! `ODMLAYER_MONGODB_URI` and `ODMLAYER_MONGODB_DATABASE` and use
//! [`MongoDbStoreBuilder::from_env`].
//!
//! # Example
//!
//! ```ignore
//! use odmlayer::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "school")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as odmlayer_mongodb;

pub mod store;
mod query;
mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
