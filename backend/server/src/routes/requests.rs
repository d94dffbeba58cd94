use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde_json::Value;
use store::{Collection, DeleteOutcome, Filter, InsertOutcome, Update, UpdateOutcome};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, parse_id},
};

pub const SERVED: &str = "Served";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requestedMeals", get(requested_meals_handler))
        // GET takes the requester's email, DELETE the request id.
        .route(
            "/requestedMeals/{key}",
            get(user_requested_meals_handler).delete(delete_request_handler),
        )
        .route("/requestMeal", post(request_meal_handler))
        .route("/serveMeal/{id}", patch(serve_meal_handler))
}

pub async fn requested_meals_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let requests = state
        .store
        .find(Collection::RequestedMeals, &Filter::All)
        .await?;

    Ok(many(requests))
}

pub async fn user_requested_meals_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let requests = state
        .store
        .find(
            Collection::RequestedMeals,
            &Filter::eq("userInfo.email", email),
        )
        .await?;

    Ok(many(requests))
}

pub async fn request_meal_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let request = get_document_from_body(body)?;

    let outcome = state
        .store
        .insert_one(Collection::RequestedMeals, request)
        .await?;

    Ok(Json(outcome))
}

pub async fn serve_meal_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;

    let outcome = state
        .store
        .update_one(
            Collection::RequestedMeals,
            &Filter::id(id),
            &Update::set_field("status", SERVED),
            false,
        )
        .await?;
    info!("Served meal request {id}");

    Ok(Json(outcome))
}

pub async fn delete_request_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_id(&id)?;

    let outcome = state
        .store
        .delete_one(Collection::RequestedMeals, &Filter::id(id))
        .await?;

    Ok(Json(outcome))
}
