use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;
use store::{Collection, Filter, InsertOutcome, Update};
use tracing::{info, warn};

use crate::{
    error::AppError,
    state::AppState,
    utils::{get_document_from_body, many, required_str},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/paymentHistory/{email}", get(payment_history_handler))
        .route("/purchasePackage", post(purchase_package_handler))
}

pub async fn payment_history_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let packages = state
        .store
        .find(Collection::UserPackages, &Filter::eq("user_email", email))
        .await?;

    Ok(many(packages))
}

/// Records a purchased package and gives its plan to the user as a badge.
pub async fn purchase_package_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsertOutcome>, AppError> {
    let package = get_document_from_body(body)?;
    let email = required_str(&package, "user_email")?.to_string();
    let plan = required_str(&package, "plan")?.to_string();

    let badge = state
        .store
        .update_one(
            Collection::Users,
            &Filter::eq("email", email.as_str()),
            &Update::set_field("badge", plan.as_str()),
            false,
        )
        .await?;
    if badge.matched_count == 0 {
        warn!("Package {plan} bought by unknown user {email}");
    }

    let outcome = state
        .store
        .insert_one(Collection::UserPackages, package)
        .await?;
    info!("User {email} purchased {plan}");

    Ok(Json(outcome))
}
