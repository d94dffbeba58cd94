use std::sync::Arc;

use store::{DocumentStore, StoreError};

use super::{config::Config, database::init_store};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let store = init_store(&config).await?;

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
