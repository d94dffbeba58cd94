#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::Value;
use server::{config::Config, routes::router, state::AppState};
use store::{
    Collection, DeleteOutcome, DocumentStore, Filter, InsertOutcome, MemoryStore, StoreError,
    Update, UpdateOutcome, bson::Document,
};
use tokio::sync::Barrier;
use tower::ServiceExt;

pub fn app() -> Router {
    router(AppState::with_store(
        Config::default(),
        Arc::new(MemoryStore::new()),
    ))
}

/// Holds each lookup on `collection` until a second one has read too, so two
/// concurrent requests see the same state before either writes.
pub struct LockstepStore {
    inner: MemoryStore,
    collection: Collection,
    barrier: Barrier,
}

/// An app over [`LockstepStore`], with the memory store behind it for setup
/// and inspection. Every lookup on `collection` waits for a second one, so
/// read that collection through the returned store.
pub fn lockstep_app(collection: Collection) -> (Router, MemoryStore) {
    let inner = MemoryStore::new();
    let store = LockstepStore {
        inner: inner.clone(),
        collection,
        barrier: Barrier::new(2),
    };

    (
        router(AppState::with_store(Config::default(), Arc::new(store))),
        inner,
    )
}

#[async_trait]
impl DocumentStore for LockstepStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let found = self.inner.find_one(collection, filter).await?;
        if collection == self.collection {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, filter).await
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        self.inner.insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        self.inner.update_one(collection, filter, update, upsert).await
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        self.inner.delete_one(collection, filter).await
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, body).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Inserts through `uri` and returns the new id.
pub async fn insert(app: &Router, uri: &str, body: Value) -> String {
    let (status, outcome) = post(app, uri, body).await;
    assert_eq!(status, StatusCode::OK, "{outcome}");

    outcome["insertedId"].as_str().unwrap().to_string()
}
