//! Login throttling against access code guessing
//!
//! Only failed logins count. A client reaching `max_failures` inside the
//! window is refused for `ban_duration_seconds`; a successful login clears
//! its record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed logins tolerated inside the window
    pub max_failures: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,
            ban_duration_seconds: 900,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new RateLimiterConfig from environment variables
    ///
    /// # Environment Variables
    /// - `LOGIN_MAX_FAILURES`: failed logins before a ban (default: 5)
    /// - `LOGIN_WINDOW_SECONDS`: counting window (default: 300)
    /// - `LOGIN_BAN_SECONDS`: ban duration (default: 900)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_failures = std::env::var("LOGIN_MAX_FAILURES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_failures);

        let window_seconds = std::env::var("LOGIN_WINDOW_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.window_seconds);

        let ban_duration_seconds = std::env::var("LOGIN_BAN_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.ban_duration_seconds);

        Self {
            max_failures,
            window_seconds,
            ban_duration_seconds,
        }
    }
}

#[derive(Debug)]
struct FailureEntry {
    failures: u32,
    first_failure: Instant,
    ban_expires: Option<Instant>,
}

/// Per-client failed login tracker
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, FailureEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` may attempt a login now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(key).and_then(|entry| entry.ban_expires) {
            Some(expires) if now < expires => false,
            Some(_) => {
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    /// Count a failed login for `key`
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        entries.retain(|_, entry| match entry.ban_expires {
            Some(expires) => now < expires,
            None => now.duration_since(entry.first_failure) < window,
        });

        let entry = entries.entry(key.to_string()).or_insert(FailureEntry {
            failures: 0,
            first_failure: now,
            ban_expires: None,
        });

        if now.duration_since(entry.first_failure) >= window {
            entry.failures = 0;
            entry.first_failure = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned {} for {} seconds after {} failed logins",
                key, self.config.ban_duration_seconds, entry.failures
            );
        }
    }

    /// Forget the failures of `key` after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
