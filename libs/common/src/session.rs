//! Session management on the shared key-value store
//!
//! A session holds the resolved identity and the access code that resolved
//! it, so the auth service can silently re-verify it and the api service can
//! read it without another login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::Identity;
use crate::store::KeyValueStore;

/// Default session lifetime: one day
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 86_400;

/// A logged-in student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub identity: Identity,
    /// Last access code that resolved successfully
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session manager for handling student sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Create a session manager with the TTL from `SESSION_TTL_SECONDS`
    pub fn from_env(store: Arc<dyn KeyValueStore>) -> Self {
        let ttl_seconds = std::env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);

        Self::new(store, ttl_seconds)
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    fn key(id: Uuid) -> String {
        format!("session:{}", id)
    }

    /// Create a new session for a resolved identity
    pub async fn create(&self, identity: Identity, access_token: &str) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            identity,
            access_token: access_token.to_string(),
            created_at: now,
            updated_at: now,
        };

        info!("Creating session {} for student {}", session.id, session.identity.id);
        self.write(&session).await?;
        Ok(session)
    }

    /// Get a session by id, `None` when unknown or expired
    pub async fn get(&self, id: Uuid) -> StoreResult<Option<Session>> {
        match self.store.get(&Self::key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the identity of an existing session and extend its lifetime
    pub async fn update(&self, session: &Session, identity: Identity) -> StoreResult<Session> {
        info!("Updating session {}", session.id);

        let updated = Session {
            identity,
            updated_at: Utc::now(),
            ..session.clone()
        };
        self.write(&updated).await?;
        Ok(updated)
    }

    /// Delete a session
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        info!("Deleting session {}", id);
        self.store.delete(&Self::key(id)).await
    }

    /// Get store health status
    pub async fn health_check(&self) -> StoreResult<bool> {
        self.store.health_check().await
    }

    async fn write(&self, session: &Session) -> StoreResult<()> {
        let raw = serde_json::to_string(session)?;
        self.store
            .set(&Self::key(session.id), &raw, Some(self.ttl_seconds))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()), 60)
    }

    #[tokio::test]
    async fn test_session_lifecycle() -> StoreResult<()> {
        let sessions = manager();
        let identity = Identity::new("recA", "Féline Faure", "F3L1N3");

        let session = sessions.create(identity.clone(), "F3L1N3").await?;
        let loaded = sessions.get(session.id).await?.unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.identity, identity);

        let renamed = Identity::new("recA", "Féline F.", "F3L1N3");
        let updated = sessions.update(&session, renamed.clone()).await?;
        assert_eq!(updated.id, session.id);
        assert_eq!(sessions.get(session.id).await?.unwrap().identity, renamed);

        sessions.delete(session.id).await?;
        assert!(sessions.get(session.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_session() -> StoreResult<()> {
        assert!(manager().get(Uuid::new_v4()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_session_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store.set(&format!("session:{}", id), "not json", None).await.unwrap();

        let sessions = SessionManager::new(store, 60);
        assert!(sessions.get(id).await.is_err());
    }
}
