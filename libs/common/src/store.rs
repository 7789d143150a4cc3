//! Persisted key-value state
//!
//! Sessions and the operator's backend credential override live here. Redis is
//! used when `REDIS_URL` is set so that the auth and api services share state;
//! otherwise an in-process store keeps a single service usable on its own.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};

/// Minimal key-value contract shared by every state backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Set a key-value pair with optional TTL
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()>;

    /// Get a value by key
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Delete a key, missing keys are not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check if the store is reachable
    async fn health_check(&self) -> StoreResult<bool>;
}

/// Configuration for the state store
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379"), `None` keeps state in memory
    pub redis_url: Option<String>,
}

impl StoreConfig {
    /// Create a new StoreConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (unset: in-memory store)
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        StoreConfig { redis_url }
    }
}

/// Open the store described by `config`
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    match &config.redis_url {
        Some(url) => Ok(Arc::new(RedisStore::new(url).await?)),
        None => {
            warn!("REDIS_URL not set, keeping sessions in process memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Initialize a new Redis client
    pub async fn new(url: &str) -> StoreResult<Self> {
        let client = Client::open(url).map_err(StoreError::Connection)?;
        info!("Redis client initialized with URL: {}", redacted_url(url));
        Ok(RedisStore { client })
    }

    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connection)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn
                .set_ex(key, value, ttl)
                .await
                .map_err(StoreError::Command)?;
        } else {
            let _: () = conn.set(key, value).await.map_err(StoreError::Command)?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(StoreError::Command)?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await.map_err(StoreError::Command)?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::Command)?;
        Ok(pong == "PONG")
    }
}

/// `url` with its password masked, fit for logs
fn redacted_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparsable>".to_string(),
    }
}

#[derive(Debug)]
struct MemoryEntry {
    value: String,
    expires: Option<Instant>,
}

/// In-process store, expired entries are dropped on read and on write
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let now = Instant::now();
        let expires = ttl_seconds.map(|ttl| now + Duration::from_secs(ttl));

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires.is_none_or(|at| now < at));
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) => entry.expires.is_some_and(|at| Instant::now() >= at),
            None => return Ok(None),
        };

        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
