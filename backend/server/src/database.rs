//! # MongoDB
//!
//! Document database behind every route.
//!
//! ## Collections
//!
//! - `allMeals`, `blogs`: catalog items with `likes` and `reviews` counters
//! - `users`, `userPackages`: accounts, roles, badges and purchases
//! - `requestedMeals`, `reviews`: meal requests and meal reviews
//! - `lawyers`, `ratings`, `comments`: lawyer profiles, their ratings, blog comments
//!
//! ## Implementation
//!
//! - One client for the whole process, shared through the app state
//! - Counters change through `$inc`, never read-modify-write
//! - Unique indexes on `users.email`, `lawyers.lawyer_email` and
//!   `ratings.(lawyerId, userId)` close the check-then-insert races
//! - If the indexes cannot be built (existing duplicates), the server still
//!   starts and relies on the read-before-insert checks alone
use std::sync::Arc;

use store::{DocumentStore, MemoryStore, MongoStore, StoreError};
use tracing::warn;

use crate::config::{Config, StoreConfig};

pub async fn init_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.store {
        StoreConfig::Memory => {
            warn!("Using the in-memory store, nothing survives a restart");

            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Mongo { uri, database } => {
            let store = MongoStore::connect(uri, database).await?;

            if let Err(e) = store.ensure_indexes().await {
                warn!("Continuing without unique indexes: {e}");
            }

            Ok(Arc::new(store))
        }
    }
}
