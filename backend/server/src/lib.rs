//! Documentation of the Lawace backend.
//!
//! Meal ordering, legal-services blogging, lawyer profiles, reviews,
//! comments and ratings over one document database.
//!
//!
//!
//! # General Infrastructure
//! - One axum server, one document store client shared by every request
//! - Every route runs a single read, write or increment and returns the result
//! - Meals and blogs share one set of catalog handlers
//! - Write routes answer with driver-shaped outcomes (`insertedId`,
//!   `matchedCount`, `modifiedCount`, `deletedCount`)
//!
//!
//!
//! # Errors
//!
//! Every failure answers `{"error": "<message>"}`.
//!
//! - 400: body is not a JSON object, a required field is missing, a malformed id or price range
//! - 404: unknown route, rating a lawyer that does not exist
//! - 409: second rating of a lawyer by the same user, duplicate lawyer email
//! - 500: the document store failed
//!
//! Lookups that find nothing are not errors, they answer `null` or `[]`.
//!
//!
//!
//! # Setup
//!
//! Run against MongoDB.
//! ```sh
//! MONGODB_URI="mongodb://localhost:27017" RUST_LOG=info cargo run
//! ```
//!
//! Run without a database, data lives in memory.
//! ```sh
//! LAWACE_STORE=memory RUST_LOG=debug cargo run
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");
    let app = routes::router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
