use crate::config::Config;
use crate::storage::KvStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<KvStore>,
}

impl AppState {
    pub fn new(config: Config, store: KvStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}
