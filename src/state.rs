use std::sync::Arc;

use crate::config::Config;
use crate::utils::html::{SanitizePolicy, Sanitizer};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sanitizer: Arc<Sanitizer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let policy = SanitizePolicy::with_base_url(config.base_url.clone());
        Self {
            sanitizer: Arc::new(Sanitizer::new(policy)),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<Sanitizer> {
    fn from_ref(state: &AppState) -> Self {
        state.sanitizer.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
