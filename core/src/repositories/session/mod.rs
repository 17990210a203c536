//! Session cache mapping a user to their active refresh token.

pub mod memory;

#[cfg(test)]
mod tests;

pub use memory::InMemorySessionCache;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreError;

/// Shared cache of "the current refresh token of this user"
///
/// Under the single-session policy this is the source of truth for which
/// refresh token belongs to the user's active device. Writing a new value
/// replaces the previous one; it does not revoke it.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `refresh_token` as the active session of `user_uuid` for `ttl`
    ///
    /// # Arguments
    /// * `user_uuid` - External user identifier
    /// * `refresh_token` - Token value to remember
    /// * `ttl` - Remaining lifetime of the refresh token
    async fn set(&self, user_uuid: Uuid, refresh_token: &str, ttl: Duration)
        -> Result<(), StoreError>;

    /// Active refresh token of `user_uuid`, if any
    async fn get(&self, user_uuid: Uuid) -> Result<Option<String>, StoreError>;

    /// Forget the active session of `user_uuid`; missing entries are not an error
    async fn delete(&self, user_uuid: Uuid) -> Result<(), StoreError>;
}
