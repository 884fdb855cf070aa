use std::sync::Arc;

use crate::{
    config::Config,
    store::{MongoStore, Store},
};

/// Shared per-process state: the loaded config and the injected store
/// client. No other mutable state is shared between requests.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = MongoStore::connect(&config.mongo_url, &config.db_name)
            .await
            .expect("Database misconfigured!");

        Arc::new(Self {
            config,
            store: Arc::new(store),
        })
    }

    #[cfg(test)]
    pub fn for_tests(store: Arc<dyn Store>) -> Arc<Self> {
        Arc::new(Self {
            config: Config::for_tests(),
            store,
        })
    }
}
