use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;
use store::{Collection, Filter, InsertOutcome};

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, required_str},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comments", post(create_comment_handler))
        .route("/comments/{blog_id}", get(blog_comments_handler))
}

pub async fn blog_comments_handler(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let comments = state
        .store
        .find(Collection::Comments, &Filter::eq("blogId", blog_id))
        .await?;

    Ok(many(comments))
}

pub async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let comment = get_document_from_body(body)?;
    required_str(&comment, "blogId")?;

    let outcome = state.store.insert_one(Collection::Comments, comment).await?;

    Ok(Json(outcome))
}
