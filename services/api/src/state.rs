//! Application state shared across handlers

use std::sync::Arc;

use common::backend::BackendConfig;
use common::error::StoreResult;
use common::session::SessionManager;
use common::store::KeyValueStore;

use crate::repositories::StudentDataRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: StudentDataRepository,
    pub sessions: SessionManager,
    pub store: Arc<dyn KeyValueStore>,
    /// Backend configuration from the environment, before operator override
    pub backend: BackendConfig,
}

impl AppState {
    /// Backend configuration in effect for this request
    pub async fn effective_backend(&self) -> StoreResult<BackendConfig> {
        self.backend.effective(self.store.as_ref()).await
    }
}
