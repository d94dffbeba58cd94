//! Meals and blogs share one handler set, told apart by the [`Catalog`]
//! extension each sub-router carries.
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde_json::Value;
use store::{Collection, DeleteOutcome, Filter, InsertOutcome, Update, UpdateOutcome};
use tracing::{debug, info};

use crate::{
    error::AppError,
    state::AppState,
    utils::{CatalogQuery, get_document_from_body, many, one, parse_id},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Catalog {
    Meals,
    Blogs,
}

struct CatalogPaths {
    everything: &'static str,
    filtered: &'static str,
    create: &'static str,
    item: &'static str,
}

impl Catalog {
    pub fn collection(self) -> Collection {
        match self {
            Catalog::Meals => Collection::Meals,
            Catalog::Blogs => Collection::Blogs,
        }
    }

    fn paths(self) -> CatalogPaths {
        match self {
            Catalog::Meals => CatalogPaths {
                everything: "/dasAllMeals",
                filtered: "/allMeals",
                create: "/addMeal",
                item: "/meal/{id}",
            },
            Catalog::Blogs => CatalogPaths {
                everything: "/dasAllBlogs",
                filtered: "/blogs",
                create: "/blog",
                item: "/blog/{id}",
            },
        }
    }
}

pub fn routes(catalog: Catalog) -> Router<Arc<AppState>> {
    let paths = catalog.paths();

    Router::new()
        .route(paths.everything, get(all_items_handler))
        .route(paths.filtered, get(filtered_items_handler))
        .route(paths.create, post(create_item_handler))
        .route(
            paths.item,
            get(item_handler)
                .patch(like_item_handler)
                .delete(delete_item_handler),
        )
        .layer(Extension(catalog))
}

pub async fn all_items_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
) -> Result<Json<Value>, AppError> {
    let items = state.store.find(catalog.collection(), &Filter::All).await?;

    Ok(many(items))
}

/// Lists items by `search`, `category` and `price`; no match is an empty array.
pub async fn filtered_items_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query.to_filter()?;
    debug!("Listing {:?} with {filter:?}", catalog);

    let items = state.store.find(catalog.collection(), &filter).await?;

    Ok(many(items))
}

pub async fn item_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let item = state
        .store
        .find_one(catalog.collection(), &Filter::id(id))
        .await?;

    Ok(one(item))
}

pub async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let item = get_document_from_body(body)?;

    let outcome = state.store.insert_one(catalog.collection(), item).await?;
    info!("Added {} {}", catalog.collection(), outcome.inserted_id);

    Ok(Json(outcome))
}

pub async fn like_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;

    let outcome = state
        .store
        .update_one(
            catalog.collection(),
            &Filter::id(id),
            &Update::inc("likes", 1),
            false,
        )
        .await?;

    Ok(Json(outcome))
}

pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(catalog): Extension<Catalog>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_id(&id)?;

    let outcome = state
        .store
        .delete_one(catalog.collection(), &Filter::id(id))
        .await?;
    info!("Deleted {} {id}: {}", catalog.collection(), outcome.deleted_count);

    Ok(Json(outcome))
}
