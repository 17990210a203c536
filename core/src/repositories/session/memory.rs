//! Process-local session cache

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::StoreError;

use super::SessionCache;

#[derive(Debug, Clone)]
struct SessionEntry {
    token: String,
    expires_at: Instant,
}

/// In-memory [`SessionCache`] with per-entry expiry
///
/// Only suitable for a single process; entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct InMemorySessionCache {
    sessions: DashMap<Uuid, SessionEntry>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn set(
        &self,
        user_uuid: Uuid,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Constraint {
                message: format!("session TTL {:?} is out of range", ttl),
            })?;
        self.sessions.insert(
            user_uuid,
            SessionEntry {
                token: refresh_token.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, user_uuid: Uuid) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        if let Some(entry) = self.sessions.get(&user_uuid) {
            if entry.expires_at > now {
                return Ok(Some(entry.token.clone()));
            }
        }
        self.sessions.remove_if(&user_uuid, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn delete(&self, user_uuid: Uuid) -> Result<(), StoreError> {
        self.sessions.remove(&user_uuid);
        Ok(())
    }
}
