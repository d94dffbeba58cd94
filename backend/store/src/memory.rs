use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    Collection, DeleteOutcome, DocumentStore, Filter, InsertOutcome, StoreError, Update,
    UpdateOutcome, filter::lookup,
};

/// An in-memory document store.
///
/// # Limitations
///
/// Nothing survives a restart and nothing is shared between processes.
/// Every operation holds one lock over all collections, so each single
/// operation is atomic while sequences of operations are not.
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<Mutex<HashMap<Collection, Vec<Document>>>>);

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when `candidate` shares a unique key with a document other than `position`.
    fn check_unique(
        collection: Collection,
        documents: &[Document],
        candidate: &Document,
        position: Option<usize>,
    ) -> Result<(), StoreError> {
        for fields in collection.unique_keys() {
            let Some(key) = unique_key(candidate, fields) else {
                continue;
            };

            let clash = documents
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != position)
                .any(|(_, existing)| unique_key(existing, fields).as_ref() == Some(&key));

            if clash {
                return Err(StoreError::duplicate(collection, fields));
            }
        }

        Ok(())
    }
}

// Documents missing any field of a unique key are not indexed by it.
fn unique_key(document: &Document, fields: &[&str]) -> Option<Vec<Bson>> {
    fields
        .iter()
        .map(|field| lookup(document, field).cloned())
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.0.lock().await;

        Ok(guard
            .get(&collection)
            .and_then(|documents| documents.iter().find(|document| filter.matches(document)))
            .cloned())
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.0.lock().await;

        Ok(guard
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self, document))]
    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.0.lock().await;
        let documents = guard.entry(collection).or_default();

        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);

        if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(StoreError::duplicate(collection, &["_id"]));
        }
        Self::check_unique(collection, documents, &document, None)?;

        documents.push(document);
        debug!("Inserted into {collection}, now {} documents", documents.len());

        Ok(InsertOutcome::new(&id))
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut guard = self.0.lock().await;
        let documents = guard.entry(collection).or_default();

        if let Some(position) = documents.iter().position(|document| filter.matches(document)) {
            let mut updated = documents[position].clone();
            let changed = update.apply(&mut updated)?;

            Self::check_unique(collection, documents, &updated, Some(position))?;
            documents[position] = updated;

            return Ok(UpdateOutcome::new(1, u64::from(changed), None));
        }

        if !upsert {
            return Ok(UpdateOutcome::new(0, 0, None));
        }

        let mut inserted = update.upserted(filter.equality_terms())?;
        if !inserted.contains_key("_id") {
            inserted.insert("_id", ObjectId::new());
        }
        let id = inserted.get("_id").cloned().unwrap_or(Bson::Null);

        Self::check_unique(collection, documents, &inserted, None)?;
        documents.push(inserted);

        Ok(UpdateOutcome::new(0, 0, Some(&id)))
    }

    #[tracing::instrument(level = tracing::Level::TRACE, skip(self))]
    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut guard = self.0.lock().await;
        let Some(documents) = guard.get_mut(&collection) else {
            return Ok(DeleteOutcome::new(0));
        };

        match documents.iter().position(|document| filter.matches(document)) {
            Some(position) => {
                documents.remove(position);
                Ok(DeleteOutcome::new(1))
            }
            None => Ok(DeleteOutcome::new(0)),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
