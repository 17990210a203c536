//! Token repository trait defining the durable token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::token::{BlacklistEntry, TokenInfo, UserToken};
use crate::domain::entities::user::UserIdentity;
use crate::errors::StoreError;

/// Durable store for issued token records, the token blacklist and user lookups
///
/// Implementations are thin wrappers over their backend: nothing is retried
/// here, and every failure is reported as a [`StoreError`] so the caller can
/// tell "not found" from transient I/O and constraint failures.
///
/// # Security Considerations
/// - Blacklist entries must be durable before any cache reports the token revoked
/// - Expired blacklist entries should be periodically cleaned up
/// - Revocation is monotonic; no method un-revokes a record
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a newly issued token record
    ///
    /// # Arguments
    /// * `record` - The record to insert, `is_revoked` is expected to be false
    ///
    /// # Returns
    /// * `Ok(())` - Record stored
    /// * `Err(StoreError::Constraint)` - A record with the same token value exists
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use blog_core::repositories::TokenRepository;
    /// # use blog_core::domain::entities::token::{TokenType, UserToken};
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let now = Utc::now();
    /// let expires_at = now + Duration::days(7);
    /// let record = UserToken::new(1, "refresh.jwt.value", TokenType::Refresh, expires_at, now);
    /// repo.save_user_token(record).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn save_user_token(&self, record: UserToken) -> Result<(), StoreError>;

    /// Revoke one of a user's tokens
    ///
    /// # Returns
    /// * `Ok(true)` - The record went from active to revoked
    /// * `Ok(false)` - No such record, or it was already revoked
    async fn revoke_user_token(&self, user_id: u64, token: &str) -> Result<bool, StoreError>;

    /// Revoke every non-revoked token of a user
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records that changed state
    async fn revoke_all_user_tokens(&self, user_id: u64) -> Result<usize, StoreError>;

    /// Active (unrevoked, unexpired) token records of a user
    async fn find_user_tokens(&self, user_id: u64) -> Result<Vec<UserToken>, StoreError>;

    /// Look up the record for a token value
    ///
    /// # Returns
    /// * `Ok(Some(TokenInfo))` - Record found
    /// * `Ok(None)` - No record for this token value
    async fn get_token_info(&self, token: &str) -> Result<Option<TokenInfo>, StoreError>;

    /// Move the expiry of a stored record
    ///
    /// # Returns
    /// * `Ok(true)` - Record updated
    /// * `Ok(false)` - No record for this token value
    async fn update_token_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Record a token as revoked
    ///
    /// Inserting the same token twice is not an error; the later reason and
    /// expiry replace the earlier ones.
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use blog_core::repositories::TokenRepository;
    /// # use blog_core::domain::entities::token::BlacklistEntry;
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let expires_at = Utc::now() + Duration::days(7);
    /// let entry = BlacklistEntry::new("refresh.jwt.value", expires_at, "user logout");
    /// repo.add_to_blacklist(entry.clone()).await?;
    /// repo.add_to_blacklist(entry).await?;
    /// assert!(repo.is_token_blacklisted("refresh.jwt.value").await?);
    /// # Ok(())
    /// # }
    /// ```
    async fn add_to_blacklist(&self, entry: BlacklistEntry) -> Result<(), StoreError>;

    /// True iff an unexpired blacklist entry exists for exactly this value
    async fn is_token_blacklisted(&self, token: &str) -> Result<bool, StoreError>;

    /// Delete blacklist entries whose expiry has passed
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of entries deleted
    async fn clean_expired_tokens(&self) -> Result<usize, StoreError>;

    /// Every currently blacklisted token value, for cache warm-up
    async fn get_all_blacklisted_tokens(&self) -> Result<Vec<String>, StoreError>;

    /// Load a user identity
    ///
    /// # Returns
    /// * `Ok(UserIdentity)` - User found
    /// * `Err(StoreError::NotFound)` - No user with this ID
    async fn get_user_by_id(&self, id: u64) -> Result<UserIdentity, StoreError>;

    /// Check whether a token is currently usable according to the store
    ///
    /// # Returns
    /// * `Ok(true)` - Not blacklisted, a record exists, not revoked and not expired
    /// * `Ok(false)` - Otherwise
    async fn is_token_valid(&self, token: &str) -> Result<bool, StoreError> {
        if self.is_token_blacklisted(token).await? {
            return Ok(false);
        }
        match self.get_token_info(token).await? {
            Some(info) => Ok(!info.is_revoked && info.expires_at > Utc::now()),
            None => Ok(false),
        }
    }

    /// Count active tokens for a user
    async fn count_user_tokens(&self, user_id: u64) -> Result<usize, StoreError> {
        Ok(self.find_user_tokens(user_id).await?.len())
    }
}
