//! In-memory revocation list - logged-out tokens until they expire.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::ports::{AuthError, Clock, TokenRevocationStore};

/// Revoked token ids with the instant after which they no longer matter.
///
/// Note: revocations are lost on process restart.
pub struct InMemoryRevocationStore {
    revoked: RwLock<HashMap<Uuid, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            revoked: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Drop entries whose tokens have expired anyway.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, until| *until > now);
        before - revoked.len()
    }
}

#[async_trait]
impl TokenRevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: Uuid, until: DateTime<Utc>) -> Result<(), AuthError> {
        let purged = self.purge_expired().await;
        if purged > 0 {
            tracing::debug!(purged, "Purged expired revocations");
        }

        self.revoked.write().await.insert(jti, until);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthError> {
        let now = self.clock.now();
        Ok(self
            .revoked
            .read()
            .await
            .get(&jti)
            .is_some_and(|until| *until > now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_revoke_until_expiry() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let store = InMemoryRevocationStore::new(clock.clone());
        let jti = Uuid::new_v4();

        store
            .revoke(jti, clock.now() + TimeDelta::hours(1))
            .await
            .unwrap();
        assert!(store.is_revoked(jti).await.unwrap());
        assert!(!store.is_revoked(Uuid::new_v4()).await.unwrap());

        clock.advance(TimeDelta::hours(2));
        assert!(!store.is_revoked(jti).await.unwrap());
        assert_eq!(store.purge_expired().await, 1);
    }
}
