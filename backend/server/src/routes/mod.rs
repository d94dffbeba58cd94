use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, state::AppState};

pub mod catalog;
pub mod comments;
pub mod lawyers;
pub mod packages;
pub mod ratings;
pub mod requests;
pub mod reviews;
pub mod users;

use catalog::Catalog;

pub const GREETING: &str = "Lawace server is running here!";

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(state.config.cors_max_age));

    Router::new()
        .route("/", get(root_handler))
        .merge(users::routes())
        .merge(packages::routes())
        .merge(catalog::routes(Catalog::Meals))
        .merge(catalog::routes(Catalog::Blogs))
        .merge(requests::routes())
        .merge(reviews::routes())
        .merge(lawyers::routes())
        .merge(comments::routes())
        .merge(ratings::routes())
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn root_handler() -> &'static str {
    GREETING
}

async fn fallback_handler() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
