//! Reviews keep the `reviews` counter of their meal in step. The review
//! write and the counter write are separate operations.
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::Value;
use store::{Collection, DeleteOutcome, Filter, InsertOutcome, Update, UpdateOutcome};
use tracing::{info, warn};

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, parse_id, required_str},
};

const REVIEWS_COUNTER: &str = "reviews";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReview {
    id: Option<String>,
    meal_id: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", get(reviews_handler))
        .route("/reviews/{meal_id}", get(meal_reviews_handler))
        .route("/userReviews/{email}", get(user_reviews_handler))
        .route("/addReview", post(add_review_handler))
        .route("/updateReview/{id}", patch(update_review_handler))
        .route("/review", delete(delete_review_handler))
}

pub async fn reviews_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let reviews = state.store.find(Collection::Reviews, &Filter::All).await?;

    Ok(many(reviews))
}

pub async fn meal_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(meal_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let reviews = state
        .store
        .find(Collection::Reviews, &Filter::eq("mealId", meal_id))
        .await?;

    Ok(many(reviews))
}

pub async fn user_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let reviews = state
        .store
        .find(Collection::Reviews, &Filter::eq("reviewer.email", email))
        .await?;

    Ok(many(reviews))
}

pub async fn add_review_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let review = get_document_from_body(body)?;
    let meal_id = parse_id(required_str(&review, "mealId")?)?;

    let outcome = state.store.insert_one(Collection::Reviews, review).await?;

    let counter = state
        .store
        .update_one(
            Collection::Meals,
            &Filter::id(meal_id),
            &Update::inc(REVIEWS_COUNTER, 1),
            false,
        )
        .await?;
    if counter.matched_count == 0 {
        warn!("Review {} points at missing meal {meal_id}", outcome.inserted_id);
    }

    Ok(Json(outcome))
}

pub async fn update_review_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;
    let update = Update::set(get_document_from_body(body)?)?;

    if update.is_empty() {
        return Err(AppError::malformed("nothing to update"));
    }

    let outcome = state
        .store
        .update_one(Collection::Reviews, &Filter::id(id), &update, false)
        .await?;
    info!("Updated review {id}");

    Ok(Json(outcome))
}

/// Deletes a review, then decrements its meal's counter only if the review
/// existed, so a repeated request cannot count down twice.
pub async fn delete_review_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteReview>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_id(params.id.as_deref().unwrap_or_default())?;
    let meal_id = parse_id(params.meal_id.as_deref().unwrap_or_default())?;

    let outcome = state
        .store
        .delete_one(Collection::Reviews, &Filter::id(id))
        .await?;

    if outcome.deleted_count > 0 {
        state
            .store
            .update_one(
                Collection::Meals,
                &Filter::id(meal_id),
                &Update::inc(REVIEWS_COUNTER, -1),
                false,
            )
            .await?;
        info!("Deleted review {id} of meal {meal_id}");
    }

    Ok(Json(outcome))
}
