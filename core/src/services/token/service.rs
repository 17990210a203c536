//! Main token service implementation

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{system_clock, Clock};
use crate::domain::entities::token::{
    mask_token, AccessClaims, BlacklistEntry, IssuedTokens, RefreshClaims, RefreshedAccess,
    TokenInfo, TokenType, UserToken,
};
use crate::domain::entities::user::UserIdentity;
use crate::errors::{DomainError, StoreError, TokenError};
use crate::repositories::{SessionCache, TokenRepository};

use super::blacklist_cache::BlacklistCache;
use super::codec::TokenCodec;
use super::config::TokenServiceConfig;
use super::context::RequestContext;

/// Blacklist reason recorded on logout
pub const LOGOUT_REASON: &str = "user logout";

/// Blacklist reason recorded when every session of a user is revoked
pub const REVOKE_ALL_REASON: &str = "all sessions revoked";

/// Service issuing, validating and revoking access and refresh tokens
pub struct TokenService<R, C>
where
    R: TokenRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    repository: Arc<R>,
    sessions: Arc<C>,
    blacklist: Arc<BlacklistCache>,
    codec: TokenCodec,
    config: TokenServiceConfig,
    clock: Arc<dyn Clock>,
}

impl<R, C> TokenService<R, C>
where
    R: TokenRepository + ?Sized,
    C: SessionCache + ?Sized,
{
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `repository` - Durable token store
    /// * `sessions` - Shared session cache
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or a configuration error if `config` is invalid
    pub fn new(
        repository: Arc<R>,
        sessions: Arc<C>,
        config: TokenServiceConfig,
    ) -> Result<Self, DomainError> {
        Self::with_clock(repository, sessions, config, system_clock())
    }

    /// Creates a token service reading time from `clock`
    pub fn with_clock(
        repository: Arc<R>,
        sessions: Arc<C>,
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let codec = TokenCodec::from_config(&config, Arc::clone(&clock));
        Ok(Self {
            repository,
            sessions,
            blacklist: Arc::new(BlacklistCache::new()),
            codec,
            config,
            clock,
        })
    }

    /// Share a blacklist cache with other services in the same process
    pub fn with_blacklist_cache(mut self, blacklist: Arc<BlacklistCache>) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn blacklist_cache(&self) -> &Arc<BlacklistCache> {
        &self.blacklist
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Issues an access/refresh pair for a freshly authenticated user
    ///
    /// The refresh token is persisted before anything is returned; if the
    /// store or (under the single-session policy) the session cache fails,
    /// no tokens are handed out.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedTokens)` - Both tokens plus their absolute expiries
    /// * `Err(TokenError::UserFrozen)` - The account is frozen
    /// * `Err(TokenError::Internal)` - Signing, store or cache failure
    pub async fn issue_login_tokens(
        &self,
        ctx: &RequestContext,
        user: &UserIdentity,
    ) -> Result<IssuedTokens, TokenError> {
        if user.frozen {
            return Err(TokenError::UserFrozen);
        }

        let now = self.clock.now();
        let (access_claims, refresh_claims) = AccessClaims::for_user(
            user,
            now,
            self.config.access_ttl,
            &self.config.issuer,
        )
        .and_then(|access| {
            RefreshClaims::for_user(user, now, self.config.refresh_ttl, &self.config.issuer)
                .map(|refresh| (access, refresh))
        })
        .map_err(|e| {
            error!(user_id = user.id, error = %e, "Failed to build token claims");
            TokenError::from(e)
        })?;

        let access_token = self.codec.encode_access(&access_claims).map_err(|e| {
            error!(user_id = user.id, error = %e, "Failed to sign access token");
            TokenError::from(e)
        })?;
        let refresh_token = self.codec.encode_refresh(&refresh_claims).map_err(|e| {
            error!(user_id = user.id, error = %e, "Failed to sign refresh token");
            TokenError::from(e)
        })?;

        let refresh_expires_at = refresh_claims.expires_at();
        let record = UserToken::new(
            user.id,
            refresh_token.clone(),
            TokenType::Refresh,
            refresh_expires_at,
            now,
        )
        .with_client(ctx.client_ip.clone(), ctx.user_agent.clone());

        self.store(ctx, self.repository.save_user_token(record))
            .await
            .map_err(|e| {
                error!(user_id = user.id, error = %e, "Failed to persist refresh token");
                TokenError::from(e)
            })?;

        if self.config.single_session {
            let ttl = remaining(refresh_expires_at, now).to_std().unwrap_or_default();
            self.cache(ctx, self.sessions.set(user.uuid, &refresh_token, ttl))
                .await
                .map_err(|e| {
                    error!(user_uuid = %user.uuid, error = %e, "Failed to record active session");
                    TokenError::from(e)
                })?;
        }

        info!(
            user_id = user.id,
            single_session = self.config.single_session,
            "Issued login tokens"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_expires_at_ms: access_claims.exp * 1000,
            refresh_expires_at_ms: refresh_claims.exp * 1000,
        })
    }

    /// Validates a bearer access token and resolves its user
    ///
    /// Checks run cheapest first: signature and expiry, the in-process
    /// blacklist, then the user lookup in the store.
    ///
    /// # Returns
    ///
    /// * `Ok(UserIdentity)` - Token is valid and the user is active
    /// * `Err(TokenError)` - Classified failure; only `Internal` is retryable
    pub async fn validate_access(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<UserIdentity, TokenError> {
        let claims = self.codec.decode_access(token).map_err(|e| {
            debug!(token = %mask_token(token), error = %e, "Access token rejected");
            TokenError::from(e)
        })?;

        if self.blacklist.contains(token) {
            debug!(user_id = claims.user_id, "Access token is blacklisted");
            return Err(TokenError::Revoked);
        }

        let user = self.load_active_user(ctx, claims.user_id).await?;
        if user.uuid != claims.uuid {
            warn!(user_id = claims.user_id, "Token UUID does not match the stored user");
            return Err(TokenError::UserNotFound);
        }
        Ok(user)
    }

    /// Mints a new access token from a refresh token
    ///
    /// The session cache is not consulted; use [`Self::is_current_session`]
    /// to bind refreshes to the most recent login.
    pub async fn refresh_access_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<RefreshedAccess, TokenError> {
        let claims = self.codec.decode_refresh(refresh_token).map_err(|e| {
            debug!(token = %mask_token(refresh_token), error = %e, "Refresh token rejected");
            TokenError::from(e)
        })?;

        if self.blacklist.contains(refresh_token) {
            debug!(user_id = claims.user_id, "Refresh token is blacklisted");
            return Err(TokenError::Revoked);
        }

        let user = self.load_active_user(ctx, claims.user_id).await?;

        let now = self.clock.now();
        let access_claims =
            AccessClaims::for_user(&user, now, self.config.access_ttl, &self.config.issuer)?;
        let access_token = self.codec.encode_access(&access_claims)?;

        debug!(user_id = user.id, "Refreshed access token");
        Ok(RefreshedAccess {
            access_token,
            access_expires_at_ms: access_claims.exp * 1000,
        })
    }

    /// Ends a login session
    ///
    /// The session cache entry is dropped first and fails open. The durable
    /// blacklist insert must succeed before the in-process cache is updated;
    /// its failure is returned so the caller can decide how to answer.
    pub async fn logout(
        &self,
        ctx: &RequestContext,
        user_uuid: Uuid,
        refresh_token: &str,
    ) -> Result<(), TokenError> {
        let claims = self.codec.peek_refresh(refresh_token).map_err(|e| {
            debug!(
                token = %mask_token(refresh_token),
                error = %e,
                "Logout with invalid refresh token"
            );
            TokenError::from(e)
        })?;

        if let Err(e) = self.cache(ctx, self.sessions.delete(user_uuid)).await {
            warn!(user_uuid = %user_uuid, error = %e, "Failed to clear session cache on logout");
        }

        let expires_at = claims.expires_at();
        if expires_at > self.clock.now() {
            self.blacklist_token(ctx, refresh_token, expires_at, LOGOUT_REASON)
                .await?;
        } else {
            debug!(
                user_id = claims.user_id,
                "Logout with expired refresh token, nothing to blacklist"
            );
        }

        self.mark_revoked(ctx, claims.user_id, refresh_token).await;

        info!(user_id = claims.user_id, user_uuid = %user_uuid, "User logged out");
        Ok(())
    }

    /// Revokes a single access or refresh token
    pub async fn revoke_token(
        &self,
        ctx: &RequestContext,
        token: &str,
        reason: &str,
    ) -> Result<(), TokenError> {
        let (user_id, expires_at) = match self.codec.peek_refresh(token) {
            Ok(claims) => (claims.user_id, claims.expires_at()),
            Err(_) => {
                let claims = self.codec.peek_access(token).map_err(TokenError::from)?;
                (claims.user_id, claims.expires_at())
            }
        };

        if expires_at > self.clock.now() {
            self.blacklist_token(ctx, token, expires_at, reason).await?;
        }
        self.mark_revoked(ctx, user_id, token).await;

        info!(user_id, reason, "Token revoked");
        Ok(())
    }

    /// Revokes every active session of `user`
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of tokens blacklisted
    pub async fn revoke_all_sessions(
        &self,
        ctx: &RequestContext,
        user: &UserIdentity,
    ) -> Result<usize, TokenError> {
        let records = self
            .store(ctx, self.repository.find_user_tokens(user.id))
            .await?;

        let mut blacklisted = 0;
        for record in &records {
            self.blacklist_token(ctx, &record.token, record.expires_at, REVOKE_ALL_REASON)
                .await?;
            blacklisted += 1;
        }

        let revoked = self
            .store(ctx, self.repository.revoke_all_user_tokens(user.id))
            .await?;

        if let Err(e) = self.cache(ctx, self.sessions.delete(user.uuid)).await {
            warn!(user_uuid = %user.uuid, error = %e, "Failed to clear session cache");
        }

        info!(user_id = user.id, blacklisted, revoked, "Revoked all sessions");
        Ok(blacklisted)
    }

    /// Whether `refresh_token` is the session currently recorded for the user
    pub async fn is_current_session(
        &self,
        ctx: &RequestContext,
        user_uuid: Uuid,
        refresh_token: &str,
    ) -> Result<bool, TokenError> {
        let current = self.cache(ctx, self.sessions.get(user_uuid)).await?;
        Ok(current.as_deref() == Some(refresh_token))
    }

    /// Active token records of a user, newest first
    pub async fn active_sessions(
        &self,
        ctx: &RequestContext,
        user_id: u64,
    ) -> Result<Vec<UserToken>, TokenError> {
        Ok(self.store(ctx, self.repository.find_user_tokens(user_id)).await?)
    }

    /// Stored record of a token value
    pub async fn token_info(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<Option<TokenInfo>, TokenError> {
        Ok(self.store(ctx, self.repository.get_token_info(token)).await?)
    }

    /// Loads every blacklisted token from the store into the in-process cache
    ///
    /// Call once at startup, before serving traffic.
    pub async fn warm_up_blacklist(&self, ctx: &RequestContext) -> Result<usize, TokenError> {
        let tokens = self
            .store(ctx, self.repository.get_all_blacklisted_tokens())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load blacklist");
                TokenError::from(e)
            })?;

        let loaded = tokens.len();
        self.blacklist.warm_up(tokens);
        info!(loaded, "Blacklist cache warmed up");
        Ok(loaded)
    }

    /// Purges expired blacklist rows from the store
    pub async fn cleanup_expired(&self, ctx: &RequestContext) -> Result<usize, TokenError> {
        let deleted = self
            .store(ctx, self.repository.clean_expired_tokens())
            .await?;
        debug!(deleted, "Expired blacklist entries purged");
        Ok(deleted)
    }

    async fn load_active_user(
        &self,
        ctx: &RequestContext,
        user_id: u64,
    ) -> Result<UserIdentity, TokenError> {
        let user = match self.store(ctx, self.repository.get_user_by_id(user_id)).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => {
                debug!(user_id, "Token references a missing user");
                return Err(TokenError::UserNotFound);
            }
            Err(e) => {
                error!(user_id, error = %e, "User lookup failed");
                return Err(TokenError::from(e));
            }
        };

        if user.frozen {
            debug!(user_id, "Token belongs to a frozen user");
            return Err(TokenError::UserFrozen);
        }
        Ok(user)
    }

    /// Durable insert first, then the in-process cache
    async fn blacklist_token(
        &self,
        ctx: &RequestContext,
        token: &str,
        expires_at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), TokenError> {
        let entry = BlacklistEntry::new(token, expires_at, reason);
        self.store(ctx, self.repository.add_to_blacklist(entry))
            .await
            .map_err(|e| {
                error!(token = %mask_token(token), error = %e, "Failed to blacklist token");
                TokenError::from(e)
            })?;
        self.blacklist.add(token);
        Ok(())
    }

    async fn mark_revoked(&self, ctx: &RequestContext, user_id: u64, token: &str) {
        if let Err(e) = self
            .store(ctx, self.repository.revoke_user_token(user_id, token))
            .await
        {
            warn!(user_id, error = %e, "Failed to mark token record revoked");
        }
    }

    async fn store<T, F>(&self, ctx: &RequestContext, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        ctx.guard_store(self.config.store_timeout, call).await
    }

    async fn cache<T, F>(&self, ctx: &RequestContext, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        ctx.guard_cache(self.config.cache_timeout, call).await
    }
}

fn remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let left = expires_at - now;
    if left > Duration::zero() {
        left
    } else {
        Duration::zero()
    }
}
