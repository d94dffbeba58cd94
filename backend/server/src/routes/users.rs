use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use serde::Serialize;
use serde_json::Value;
use store::{Collection, Filter, StoreError, Update, UpdateOutcome};
use tracing::{debug, info};

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, one, parse_id, required_str},
};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExists {
    message: &'static str,
    inserted_id: Option<String>,
}

impl Default for UserExists {
    fn default() -> Self {
        Self {
            message: "User already exists!",
            inserted_id: None,
        }
    }
}

#[derive(Serialize)]
pub struct AdminStatus {
    admin: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/{email}", get(user_handler))
        .route("/users", get(users_handler).post(create_user_handler))
        .route("/users/{email}", get(user_handler))
        .route("/admin/{email}", get(admin_handler))
        .route("/makeAdmin/{id}", patch(make_admin_handler))
}

pub async fn user_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", email))
        .await?;

    Ok(one(user))
}

pub async fn users_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let users = state.store.find(Collection::Users, &Filter::All).await?;

    Ok(many(users))
}

/// Inserts the user unless one with the same email exists.
///
/// The unique index on `email` catches the race between two identical
/// requests that both pass the lookup.
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let user = get_document_from_body(body)?;
    let email = required_str(&user, "email")?.to_string();

    let existing = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", email.as_str()))
        .await?;
    if existing.is_some() {
        debug!("User {email} already exists");
        return Ok(Json(UserExists::default()).into_response());
    }

    match state.store.insert_one(Collection::Users, user).await {
        Ok(outcome) => {
            info!("Created user {email}");
            Ok(Json(outcome).into_response())
        }
        Err(StoreError::Duplicate { .. }) => Ok(Json(UserExists::default()).into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn admin_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AppError> {
    let user = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", email))
        .await?;

    let admin = user.is_some_and(|user| user.get_str("role").is_ok_and(|role| role == ADMIN_ROLE));

    Ok(Json(AdminStatus { admin }))
}

pub async fn make_admin_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;

    let outcome = state
        .store
        .update_one(
            Collection::Users,
            &Filter::id(id),
            &Update::set_field("role", ADMIN_ROLE),
            false,
        )
        .await?;
    info!("Promoted user {id} to admin, matched {}", outcome.matched_count);

    Ok(Json(outcome))
}
