//! Redis-backed session cache
//!
//! Stores the active refresh token of each user under
//! `{prefix}:session:{uuid}` with the token's remaining lifetime as TTL, so
//! every service instance sees the same "current session".

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use blog_core::errors::StoreError;
use blog_core::repositories::SessionCache;

use super::redis_client::RedisClient;

const SESSION_NAMESPACE: &str = "session";

/// Session cache on top of [`RedisClient`]
#[derive(Clone)]
pub struct RedisSessionCache {
    client: RedisClient,
}

impl RedisSessionCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Full Redis key for a user's session
    pub fn session_key(&self, user_uuid: Uuid) -> String {
        self.client
            .config()
            .make_key(&format!("{}:{}", SESSION_NAMESPACE, user_uuid))
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn set(
        &self,
        user_uuid: Uuid,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = self.session_key(user_uuid);
        if ttl.is_zero() {
            // Nothing left to remember; drop whatever was there
            self.client.delete(&key).await.map_err(StoreError::unavailable)?;
            return Ok(());
        }
        self.client
            .set_with_expiry(&key, refresh_token, ttl)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn get(&self, user_uuid: Uuid) -> Result<Option<String>, StoreError> {
        self.client
            .get(&self.session_key(user_uuid))
            .await
            .map_err(StoreError::unavailable)
    }

    async fn delete(&self, user_uuid: Uuid) -> Result<(), StoreError> {
        self.client
            .delete(&self.session_key(user_uuid))
            .await
            .map(|_| ())
            .map_err(StoreError::unavailable)
    }
}
