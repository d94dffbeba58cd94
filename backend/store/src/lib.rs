//! # Document Store
//!
//! Data access for the Lawace backend.
//!
//! Every handler runs a single read, write or increment against one named
//! collection. This crate hides which database answers it.
//!
//! ## Backends
//!
//! - [`MongoStore`]: MongoDB through the official driver, used in deployment
//! - [`MemoryStore`]: in-process maps, used by tests and local development
//!
//! ## Filters and Updates
//!
//! Handlers never write raw query documents. They build a [`Filter`] and an
//! [`Update`], which render to BSON for MongoDB and evaluate directly against
//! documents in memory, so both backends agree on what matches.
//!
//! ## Uniqueness
//!
//! - `users.email`
//! - `lawyers.lawyer_email`
//! - `ratings.(lawyerId, userId)`
//!
//! MongoDB enforces these with unique indexes created by
//! [`DocumentStore::ensure_indexes`], the memory store checks them on every
//! write. A violation surfaces as [`StoreError::Duplicate`].
use async_trait::async_trait;
use mongodb::bson::Document;

pub mod collection;
pub mod error;
pub mod filter;
pub mod json;
pub mod memory;
pub mod mongo;
pub mod outcome;
pub mod update;

pub use mongodb::bson;

pub use collection::Collection;
pub use error::StoreError;
pub use filter::Filter;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use outcome::{DeleteOutcome, InsertOutcome, UpdateOutcome};
pub use update::Update;

/// The operations the HTTP layer may issue against a collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching `filter`, if any.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns every document matching `filter`, in insertion order.
    async fn find(&self, collection: Collection, filter: &Filter)
    -> Result<Vec<Document>, StoreError>;

    /// Inserts `document`, assigning an object id when `_id` is absent.
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, StoreError>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// With `upsert`, a document built from the equality terms of `filter`
    /// and the update is inserted when nothing matches.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Deletes the first document matching `filter`.
    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Creates the unique indexes listed by [`Collection::unique_keys`].
    async fn ensure_indexes(&self) -> Result<(), StoreError>;
}
