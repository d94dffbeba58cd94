use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::get,
};
use serde_json::Value;
use store::{
    Collection, Filter, InsertOutcome, Update, UpdateOutcome,
    bson::{Document, oid::ObjectId},
};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, one, required_str},
};

pub const LAWYER_EMAIL: &str = "lawyer_email";
pub const TOTAL_RATING: &str = "totalRating";
pub const RATING_COUNT: &str = "ratingCount";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lawyers", get(lawyers_handler).post(create_lawyer_handler))
        // GET takes an id or an email, PUT always an email.
        .route(
            "/lawyer/{key}",
            get(lawyer_handler).put(upsert_lawyer_handler),
        )
}

fn fresh_counters() -> Document {
    let mut counters = Document::new();
    counters.insert(TOTAL_RATING, 0);
    counters.insert(RATING_COUNT, 0);
    counters
}

pub async fn lawyers_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let lawyers = state.store.find(Collection::Lawyers, &Filter::All).await?;

    Ok(many(lawyers))
}

pub async fn lawyer_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let filter = match ObjectId::parse_str(&key) {
        Ok(id) => Filter::id(id),
        Err(_) => Filter::eq(LAWYER_EMAIL, key),
    };

    let lawyer = state.store.find_one(Collection::Lawyers, &filter).await?;

    Ok(one(lawyer))
}

pub async fn create_lawyer_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let mut lawyer = get_document_from_body(body)?;
    required_str(&lawyer, LAWYER_EMAIL)?;

    for (counter, zero) in fresh_counters() {
        if !lawyer.contains_key(&counter) {
            lawyer.insert(counter, zero);
        }
    }

    let outcome = state.store.insert_one(Collection::Lawyers, lawyer).await?;

    Ok(Json(outcome))
}

/// Creates or updates the profile keyed by email.
///
/// Rating aggregates are owned by the rating route and never taken from
/// the body; a new profile starts them at zero.
pub async fn upsert_lawyer_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    body: Bytes,
) -> Result<Json<UpdateOutcome>, AppError> {
    let mut profile = get_document_from_body(body)?;
    profile.remove(TOTAL_RATING);
    profile.remove(RATING_COUNT);
    profile.insert(LAWYER_EMAIL, email.as_str());

    let update = Update::set(profile)?.and_set_on_insert(fresh_counters());

    let outcome = state
        .store
        .update_one(
            Collection::Lawyers,
            &Filter::eq(LAWYER_EMAIL, email.as_str()),
            &update,
            true,
        )
        .await?;
    info!(
        "Lawyer {email} {}",
        if outcome.upserted_count > 0 { "created" } else { "updated" }
    );

    Ok(Json(outcome))
}
