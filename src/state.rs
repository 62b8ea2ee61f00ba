use std::sync::Arc;

use crate::auth::GoogleVerifier;
use crate::config::AppConfig;
use crate::database::Store;
use crate::sync::Synchronizer;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub sync: Arc<Synchronizer>,
    pub google: Arc<dyn GoogleVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, google: Arc<dyn GoogleVerifier>) -> Self {
        let sync = Arc::new(Synchronizer::new(store.clone(), config.roles.clone()));
        Self {
            config: Arc::new(config),
            store,
            sync,
            google,
        }
    }
}
