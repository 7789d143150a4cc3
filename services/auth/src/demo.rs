//! Fixed demo identities
//!
//! These access codes always resolve, without touching the record store,
//! so the dashboard can be shown even when the backend is down or
//! unconfigured.

use common::models::Identity;
use tracing::info;

/// Access code of the generic demo student
pub const DEMO_ACCESS_CODE: &str = "access123";

/// Access code of the showcased student
pub const SHOWCASE_ACCESS_CODE: &str = "rech0KgjCrK24UrBH";

/// Access code → identity table
#[derive(Debug, Clone)]
pub struct DemoDirectory {
    entries: Vec<(String, Identity)>,
}

impl Default for DemoDirectory {
    fn default() -> Self {
        Self {
            entries: vec![
                (
                    DEMO_ACCESS_CODE.to_string(),
                    Identity::new("demo123", "Utilisateur Démo", DEMO_ACCESS_CODE)
                        .with_email("demo@example.com"),
                ),
                (
                    SHOWCASE_ACCESS_CODE.to_string(),
                    Identity::new(SHOWCASE_ACCESS_CODE, "Féline Faure", SHOWCASE_ACCESS_CODE)
                        .with_email("feline.faure@example.com"),
                ),
            ],
        }
    }
}

impl DemoDirectory {
    /// Directory without any demo identity
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn lookup(&self, token: &str) -> Option<Identity> {
        self.entries
            .iter()
            .find(|(code, _)| code == token)
            .map(|(_, identity)| identity.clone())
    }

    /// Demo identities unless `DEMO_LOGINS` turns them off (`false`, `0`, `off`)
    pub fn from_env() -> Self {
        let disabled = std::env::var("DEMO_LOGINS")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "off" | "no"))
            .unwrap_or(false);

        if disabled {
            info!("Demo access codes disabled");
            Self::empty()
        } else {
            Self::default()
        }
    }
}
