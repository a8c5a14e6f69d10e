//! Process-wide bot-identity cache.
//!
//! The bot's own user id is needed for mention detection. It is resolved
//! via `auth.test` with bounded backoff, cached for the process lifetime,
//! and re-attempted lazily on the next event while unresolved. Until it
//! resolves, channel-mention eligibility degrades to never-eligible.

use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::adapter::SlackAdapter;

const RESOLVE_ATTEMPTS: u32 = 3;
const RESOLVE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Default)]
pub struct BotIdentity {
    user_id: RwLock<Option<String>>,
}

impl BotIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached identity, if already resolved.
    pub async fn get(&self) -> Option<String> {
        self.user_id.read().await.clone()
    }

    /// Cached-or-resolving accessor: returns the cached id, or attempts
    /// resolution with backoff. Returns `None` when all attempts fail;
    /// the next call retries.
    pub async fn get_or_resolve(&self, adapter: &SlackAdapter) -> Option<String> {
        if let Some(id) = self.get().await {
            return Some(id);
        }

        for attempt in 1..=RESOLVE_ATTEMPTS {
            match adapter.bot_user_id().await {
                Ok(id) => {
                    info!(user_id = %id, "bot identity resolved");
                    *self.user_id.write().await = Some(id.clone());
                    return Some(id);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "auth.test failed");
                    if attempt < RESOLVE_ATTEMPTS {
                        tokio::time::sleep(RESOLVE_BACKOFF * attempt).await;
                    }
                }
            }
        }
        None
    }

    /// Pre-seed the cache (used at startup once auth.test succeeds, and
    /// by tests).
    pub async fn set(&self, user_id: String) {
        *self.user_id.write().await = Some(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_unresolved() {
        let identity = BotIdentity::new();
        assert_eq!(identity.get().await, None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let identity = BotIdentity::new();
        identity.set("UBOT".to_string()).await;
        assert_eq!(identity.get().await, Some("UBOT".to_string()));
    }
}
