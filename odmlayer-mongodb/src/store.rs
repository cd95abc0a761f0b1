use std::env;
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::ClientOptions,
};
use odmlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::Record,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

use crate::{sanitizer::FieldSanitizer, query::MongoQueryTranslator};

/// Environment variable holding the connection string read by [`MongoDbStoreBuilder::from_env`].
pub const URI_ENV: &str = "ODMLAYER_MONGODB_URI";
/// Environment variable holding the database name read by [`MongoDbStoreBuilder::from_env`].
pub const DATABASE_ENV: &str = "ODMLAYER_MONGODB_DATABASE";


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Record> {
        self.client
            .database(&self.database)
            .collection(&FieldSanitizer::sanitize_key(collection_name))
    }

    fn prepare_record(&self, id: Uuid, record: Record) -> Record {
        let mut prepared = doc! { "_id": id };
        for (key, value) in FieldSanitizer::sanitize_record(record) {
            prepared.insert(key, value);
        }
        prepared
    }

    fn restore_record(&self, mut record: Record) -> DocumentStoreResult<(Uuid, Record)> {
        let id = match record.remove("_id") {
            Some(Bson::Binary(binary)) => binary.to_uuid()?,
            other => {
                return Err(DocumentStoreError::Serialization(format!(
                    "expected a UUID `_id`, found {other:?}"
                )));
            }
        };

        Ok((id, FieldSanitizer::restore_record(record)))
    }
}

fn map_err(err: mongodb::error::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, record: Record, collection: &str) -> DocumentStoreResult<Uuid> {
        let id = Uuid::new();

        self.get_collection(collection)
            .insert_one(self.prepare_record(id, record))
            .await
            .map_err(map_err)?;

        tracing::trace!(collection, %id, "inserted record");

        Ok(id)
    }

    async fn get_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<Option<Record>> {
        self.get_collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_err)?
            .map(|record| self.restore_record(record).map(|(_, record)| record))
            .transpose()
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<(Uuid, Record)>> {
        let filter = MongoQueryTranslator::translate(&query);

        tracing::trace!(collection, %filter, "running query");

        self.get_collection(collection)
            .find(filter)
            .await
            .map_err(map_err)?
            .try_collect::<Vec<Record>>()
            .await
            .map_err(map_err)?
            .into_iter()
            .map(|record| self.restore_record(record))
            .collect()
    }

    async fn update_document(&self, id: Uuid, record: Record, collection: &str) -> DocumentStoreResult<()> {
        let result = self
            .get_collection(collection)
            .replace_one(doc! { "_id": id }, self.prepare_record(id, record))
            .await
            .map_err(map_err)?;

        if result.matched_count == 0 {
            return Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        tracing::trace!(collection, %id, "replaced record");

        Ok(())
    }

    async fn delete_document(&self, id: Uuid, collection: &str) -> DocumentStoreResult<()> {
        let result = self
            .get_collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(map_err)?;

        if result.deleted_count == 0 {
            return Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        tracing::trace!(collection, %id, "removed record");

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(map_err)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Connection settings for [`MongoDbStore`].
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }

    /// Reads the connection string from `ODMLAYER_MONGODB_URI` and the database name from
    /// `ODMLAYER_MONGODB_DATABASE`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if either variable is unset or not
    /// valid unicode.
    pub fn from_env() -> DocumentStoreResult<Self> {
        let dsn = env::var(URI_ENV)
            .map_err(|_| DocumentStoreError::Initialization(format!("{URI_ENV} is not set")))?;
        let database = env::var(DATABASE_ENV)
            .map_err(|_| DocumentStoreError::Initialization(format!("{DATABASE_ENV} is not set")))?;

        Ok(Self { dsn, database })
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
        )
        .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        tracing::debug!(database = %self.database, "connected to mongodb");

        Ok(MongoDbStore::new(client, self.database))
    }
}
