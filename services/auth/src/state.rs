//! Application state shared across handlers

use std::sync::Arc;

use common::backend::BackendConfig;
use common::error::StoreResult;
use common::session::SessionManager;
use common::store::KeyValueStore;

use crate::rate_limiter::RateLimiter;
use crate::resolver::AccessResolver;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: AccessResolver,
    pub sessions: SessionManager,
    pub store: Arc<dyn KeyValueStore>,
    /// Backend configuration from the environment, before operator override
    pub backend: BackendConfig,
    /// Secret guarding the backend override endpoints, `None` disables them
    pub operator_key: Option<String>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Backend configuration in effect for this request
    pub async fn effective_backend(&self) -> StoreResult<BackendConfig> {
        self.backend.effective(self.store.as_ref()).await
    }
}
