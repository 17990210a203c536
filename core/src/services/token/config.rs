//! Configuration for the token service

use std::time::Duration as StdDuration;

use blog_shared::config::AuthConfig;
use blog_shared::utils::duration::parse_duration;
use chrono::Duration;

use crate::errors::DomainError;

const DEV_ACCESS_SECRET: &str = "development-access-secret-please-change";
const DEV_REFRESH_SECRET: &str = "development-refresh-secret-please-change";

/// Longest accepted token lifetime, in days
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Immutable runtime configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// HMAC secret for access tokens
    pub access_secret: String,
    /// HMAC secret for refresh tokens, must differ from `access_secret`
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// `iss` claim written and expected
    pub issuer: String,
    /// Keep at most one active refresh session per user
    pub single_session: bool,
    /// Upper bound for a single durable store call
    pub store_timeout: StdDuration,
    /// Upper bound for a single session cache call
    pub cache_timeout: StdDuration,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::new(DEV_ACCESS_SECRET, DEV_REFRESH_SECRET)
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .field("single_session", &self.single_session)
            .field("store_timeout", &self.store_timeout)
            .field("cache_timeout", &self.cache_timeout)
            .finish()
    }
}

impl TokenServiceConfig {
    /// Configuration with the given secrets and default lifetimes (15m / 7d)
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            issuer: String::from("personal-blog"),
            single_session: false,
            store_timeout: StdDuration::from_secs(3),
            cache_timeout: StdDuration::from_millis(200),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_single_session(mut self, enabled: bool) -> Self {
        self.single_session = enabled;
        self
    }

    pub fn with_timeouts(mut self, store_timeout: StdDuration, cache_timeout: StdDuration) -> Self {
        self.store_timeout = store_timeout;
        self.cache_timeout = cache_timeout;
        self
    }

    /// Check the invariants the service relies on
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(invalid("JWT secrets must not be empty"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(invalid("access and refresh tokens must use different secrets"));
        }
        if self.access_ttl <= Duration::zero() || self.refresh_ttl <= Duration::zero() {
            return Err(invalid("token lifetimes must be positive"));
        }
        let max_ttl = Duration::days(MAX_TOKEN_TTL_DAYS);
        if self.access_ttl > max_ttl || self.refresh_ttl > max_ttl {
            return Err(DomainError::Configuration {
                message: format!("token lifetimes must not exceed {} days", MAX_TOKEN_TTL_DAYS),
            });
        }
        if self.refresh_ttl <= self.access_ttl {
            return Err(invalid("refresh token lifetime must exceed the access token lifetime"));
        }
        if self.issuer.trim().is_empty() {
            return Err(invalid("issuer must not be empty"));
        }
        if self.store_timeout.is_zero() || self.cache_timeout.is_zero() {
            return Err(invalid("store and cache timeouts must be positive"));
        }
        Ok(())
    }
}

impl TryFrom<&AuthConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(auth: &AuthConfig) -> Result<Self, Self::Error> {
        let config = Self {
            access_secret: auth.jwt.access_token_secret.clone(),
            refresh_secret: auth.jwt.refresh_token_secret.clone(),
            access_ttl: ttl("access_token_expiry_time", &auth.jwt.access_token_expiry_time)?,
            refresh_ttl: ttl("refresh_token_expiry_time", &auth.jwt.refresh_token_expiry_time)?,
            issuer: auth.jwt.issuer.clone(),
            single_session: auth.session.single_session,
            store_timeout: StdDuration::from_millis(auth.session.store_timeout_ms),
            cache_timeout: StdDuration::from_millis(auth.session.cache_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

fn ttl(field: &str, value: &str) -> Result<Duration, DomainError> {
    let parsed = parse_duration(value).map_err(|e| DomainError::Configuration {
        message: format!("{}: {}", field, e),
    })?;
    Duration::from_std(parsed).map_err(|e| DomainError::Configuration {
        message: format!("{}: {}", field, e),
    })
}

fn invalid(message: &str) -> DomainError {
    DomainError::Configuration {
        message: message.to_string(),
    }
}
