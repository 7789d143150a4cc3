//! Record store configuration
//!
//! The configuration is an explicit value handed to every gateway call. The
//! operator may override the base and API key at runtime; the override is
//! persisted in the state store and merged in at the start of each operation.

use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::error::{RecordError, RecordResult, StoreResult};
use crate::store::KeyValueStore;

/// Default public endpoint of the hosted record store
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Store key of the overridden base identifier
pub const BASE_ID_KEY: &str = "backend_base_id";

/// Store key of the overridden API key
pub const API_KEY_KEY: &str = "backend_api_key";

/// Base identifier and API key of the record store
#[derive(Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    pub base_id: String,
    pub api_key: String,
}

impl BackendCredentials {
    pub fn new(base_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            api_key: api_key.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.base_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("base_id", &self.base_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Record store configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root, without the base identifier
    pub api_url: String,
    /// Credentials, `None` when the backend is unconfigured
    pub credentials: Option<BackendCredentials>,
    /// Total attempts for a transient failure (first try included)
    pub max_attempts: u32,
    /// Fixed pause between two attempts
    pub retry_delay: Duration,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
    /// Upper bound on followed pagination cursors
    pub max_pages: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credentials: None,
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            max_pages: 20,
        }
    }
}

impl BackendConfig {
    /// Create a new BackendConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BACKEND_API_URL`: API root (default: "https://api.airtable.com/v0")
    /// - `BACKEND_BASE_ID`: base identifier
    /// - `BACKEND_API_KEY`: personal access token
    /// - `BACKEND_MAX_ATTEMPTS`: attempts on transient failure (default: 3)
    /// - `BACKEND_RETRY_DELAY_MS`: delay between attempts (default: 500)
    /// - `BACKEND_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `BACKEND_MAX_PAGES`: pagination cap (default: 20)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("BACKEND_API_URL").unwrap_or(defaults.api_url);

        let credentials = match (
            std::env::var("BACKEND_BASE_ID"),
            std::env::var("BACKEND_API_KEY"),
        ) {
            (Ok(base_id), Ok(api_key)) => Some(BackendCredentials::new(base_id, api_key))
                .filter(BackendCredentials::is_complete),
            _ => None,
        };

        let max_attempts = std::env::var("BACKEND_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_attempts);

        let retry_delay = std::env::var("BACKEND_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);

        let request_timeout = std::env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_pages = std::env::var("BACKEND_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_pages);

        BackendConfig {
            api_url,
            credentials,
            max_attempts,
            retry_delay,
            request_timeout,
            max_pages,
        }
    }

    /// Replace the credentials, keeping transport settings
    pub fn with_credentials(mut self, credentials: BackendCredentials) -> Self {
        self.credentials = Some(credentials).filter(BackendCredentials::is_complete);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(BackendCredentials::is_complete)
    }

    /// Credentials for a request, `Unconfigured` when absent
    pub fn credentials(&self) -> RecordResult<&BackendCredentials> {
        self.credentials
            .as_ref()
            .filter(|c| c.is_complete())
            .ok_or(RecordError::Unconfigured)
    }

    /// Merge the operator override persisted in `store`, if any
    pub async fn effective(&self, store: &dyn KeyValueStore) -> StoreResult<Self> {
        match load_override(store).await? {
            Some(credentials) => Ok(self.clone().with_credentials(credentials)),
            None => Ok(self.clone()),
        }
    }
}

/// Read the operator's credential override
pub async fn load_override(store: &dyn KeyValueStore) -> StoreResult<Option<BackendCredentials>> {
    let base_id = store.get(BASE_ID_KEY).await?;
    let api_key = store.get(API_KEY_KEY).await?;

    Ok(match (base_id, api_key) {
        (Some(base_id), Some(api_key)) => {
            Some(BackendCredentials::new(base_id, api_key)).filter(BackendCredentials::is_complete)
        }
        _ => None,
    })
}

/// Persist an operator override of the backend credentials
pub async fn save_override(
    store: &dyn KeyValueStore,
    credentials: &BackendCredentials,
) -> StoreResult<()> {
    store.set(BASE_ID_KEY, &credentials.base_id, None).await?;
    store.set(API_KEY_KEY, &credentials.api_key, None).await?;
    info!(base_id = %credentials.base_id, "Backend credential override saved");
    Ok(())
}

/// Drop the operator override, falling back to environment credentials
pub async fn clear_override(store: &dyn KeyValueStore) -> StoreResult<()> {
    store.delete(BASE_ID_KEY).await?;
    store.delete(API_KEY_KEY).await?;
    info!("Backend credential override cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "BACKEND_API_URL",
        "BACKEND_BASE_ID",
        "BACKEND_API_KEY",
        "BACKEND_MAX_ATTEMPTS",
        "BACKEND_RETRY_DELAY_MS",
        "BACKEND_TIMEOUT_SECS",
        "BACKEND_MAX_PAGES",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_backend_config_defaults() {
        clear_env();

        let config = BackendConfig::from_env();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.is_configured());
        assert_eq!(config.credentials(), Err(RecordError::Unconfigured));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_pages, 20);
    }

    #[test]
    #[serial]
    fn test_backend_config_from_env_with_custom_values() {
        clear_env();
        unsafe {
            std::env::set_var("BACKEND_API_URL", "http://localhost:9999/v0");
            std::env::set_var("BACKEND_BASE_ID", "appTest");
            std::env::set_var("BACKEND_API_KEY", "patTest");
            std::env::set_var("BACKEND_MAX_ATTEMPTS", "2");
            std::env::set_var("BACKEND_RETRY_DELAY_MS", "50");
        }

        let config = BackendConfig::from_env();
        assert_eq!(config.api_url, "http://localhost:9999/v0");
        assert!(config.is_configured());
        assert_eq!(config.credentials().unwrap().base_id, "appTest");
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_delay, Duration::from_millis(50));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_credentials_are_unconfigured() {
        clear_env();
        unsafe {
            std::env::set_var("BACKEND_BASE_ID", "appTest");
            std::env::set_var("BACKEND_API_KEY", "  ");
        }

        assert!(!BackendConfig::from_env().is_configured());

        clear_env();
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let credentials = BackendCredentials::new("appX", "pat-secret");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("appX"));
        assert!(!printed.contains("pat-secret"));
    }

    #[tokio::test]
    async fn test_override_round_trip() -> StoreResult<()> {
        let store = MemoryStore::new();
        let base = BackendConfig::default();

        assert!(!base.effective(&store).await?.is_configured());

        save_override(&store, &BackendCredentials::new("appOverride", "patOverride")).await?;
        let effective = base.effective(&store).await?;
        assert_eq!(effective.credentials().unwrap().base_id, "appOverride");
        assert_eq!(effective.max_attempts, base.max_attempts);

        clear_override(&store).await?;
        assert!(!base.effective(&store).await?.is_configured());
        Ok(())
    }
}
