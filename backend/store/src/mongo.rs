//! # MongoDB
//!
//! Deployment backend, one client shared by every request.
//!
//! ## Notes
//!
//! - The driver keeps its own connection pool, the client is cheap to share
//! - Timeouts and retries are the driver defaults
//! - Writes are single-document, no sessions or transactions
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
};
use tracing::{debug, info, warn};

use crate::{
    Collection, DeleteOutcome, DocumentStore, Filter, InsertOutcome, StoreError, Update,
    UpdateOutcome,
};

const APP_NAME: &str = "lawace";
const DUPLICATE_KEY: i32 = 11000;
const ID_KEY: &[&str] = &["_id"];

#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client = Client::with_options(options)?;
        let database = client.database(database);

        database.run_command(doc! { "ping": 1 }).await?;
        info!("Connected to MongoDB database {}", database.name());

        Ok(Self { database })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.database.collection(collection.name())
    }
}

// Names the violated key the way the memory store does; the driver message
// carries the index name and the offending value.
fn duplicate_or(collection: Collection, error: mongodb::error::Error) -> StoreError {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY =>
        {
            debug!("{}", write_error.message);
            let fields = violated_key(collection, &write_error.message);
            StoreError::duplicate(collection, fields)
        }
        _ => StoreError::Backend(error),
    }
}

// Index names default to `field_1` pairs joined by `_`, e.g. `lawyerId_1_userId_1`.
fn violated_key(collection: Collection, message: &str) -> &'static [&'static str] {
    collection
        .unique_keys()
        .iter()
        .copied()
        .find(|fields| message.contains(&index_name(fields)))
        .unwrap_or(ID_KEY)
}

fn index_name(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| format!("{field}_1"))
        .collect::<Vec<_>>()
        .join("_")
}

#[async_trait]
impl DocumentStore for MongoStore {
    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(filter.to_document())
            .await?)
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(filter.to_document())
            .await?;

        Ok(cursor.try_collect().await?)
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self, document))]
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| duplicate_or(collection, e))?;

        Ok(InsertOutcome::new(&result.inserted_id))
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(filter.to_document(), update.to_document())
            .upsert(upsert)
            .await
            .map_err(|e| duplicate_or(collection, e))?;

        Ok(UpdateOutcome::new(
            result.matched_count,
            result.modified_count,
            result.upserted_id.as_ref(),
        ))
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(filter.to_document())
            .await?;

        Ok(DeleteOutcome::new(result.deleted_count))
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            for fields in collection.unique_keys() {
                let mut keys = Document::new();
                for field in *fields {
                    keys.insert(*field, 1);
                }

                let index = IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().unique(true).build())
                    .build();

                let created = self
                    .collection(collection)
                    .create_index(index)
                    .await
                    .inspect_err(|e| {
                        warn!("Unique index on {collection} ({}) failed: {e}", fields.join(", "));
                    })?;

                info!("Unique index {} on {collection}", created.index_name);
            }
        }

        Ok(())
    }
}
