//! One rating per user per lawyer, each folded into the lawyer's
//! `totalRating` and `ratingCount`.
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;
use store::{
    Collection, Filter, InsertOutcome, StoreError, Update,
    bson::{Bson, DateTime},
    filter::as_number,
};
use tracing::{info, warn};

use super::lawyers::{RATING_COUNT, TOTAL_RATING};
use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, one, parse_id, required_str},
};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

const ALREADY_RATED: &str = "You have already rated this lawyer";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ratings", post(create_rating_handler))
        .route("/ratings/{lawyer_id}", get(lawyer_ratings_handler))
        .route("/ratings/{lawyer_id}/{user_id}", get(user_rating_handler))
}

fn is_rating(value: &Bson) -> bool {
    as_number(value).is_some_and(|n| (MIN_RATING..=MAX_RATING).contains(&n))
}

fn rating_of(lawyer_id: &str, user_id: &str) -> Filter {
    Filter::eq("lawyerId", lawyer_id).and(Filter::eq("userId", user_id))
}

pub async fn lawyer_ratings_handler(
    State(state): State<Arc<AppState>>,
    Path(lawyer_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let ratings = state
        .store
        .find(Collection::Ratings, &Filter::eq("lawyerId", lawyer_id))
        .await?;

    Ok(many(ratings))
}

pub async fn user_rating_handler(
    State(state): State<Arc<AppState>>,
    Path((lawyer_id, user_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let rating = state
        .store
        .find_one(Collection::Ratings, &rating_of(&lawyer_id, &user_id))
        .await?;

    Ok(one(rating))
}

pub async fn create_rating_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let mut rating = get_document_from_body(body)?;

    let lawyer_id = required_str(&rating, "lawyerId")?.to_string();
    let user_id = required_str(&rating, "userId")?.to_string();
    let lawyer = parse_id(&lawyer_id)?;

    let score = rating
        .get("rating")
        .filter(|score| is_rating(score))
        .cloned()
        .ok_or_else(|| {
            AppError::malformed(format!(
                "rating must be a number from {MIN_RATING} to {MAX_RATING}"
            ))
        })?;

    if state
        .store
        .find_one(Collection::Lawyers, &Filter::id(lawyer))
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("Lawyer {lawyer_id} not found")));
    }

    let previous = state
        .store
        .find_one(Collection::Ratings, &rating_of(&lawyer_id, &user_id))
        .await?;
    if previous.is_some() {
        return Err(AppError::Conflict(ALREADY_RATED.to_string()));
    }

    if !rating.contains_key("timestamp") {
        rating.insert("timestamp", DateTime::now());
    }

    let outcome = match state.store.insert_one(Collection::Ratings, rating).await {
        Ok(outcome) => outcome,
        Err(StoreError::Duplicate { .. }) => {
            warn!("Concurrent rating of {lawyer_id} by {user_id} rejected");
            return Err(AppError::Conflict(ALREADY_RATED.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    state
        .store
        .update_one(
            Collection::Lawyers,
            &Filter::id(lawyer),
            &Update::inc(TOTAL_RATING, score).and_inc(RATING_COUNT, 1),
            false,
        )
        .await?;
    info!("User {user_id} rated lawyer {lawyer_id}");

    Ok(Json(outcome))
}
