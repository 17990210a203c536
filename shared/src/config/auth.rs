//! Authentication configuration

use serde::{Deserialize, Serialize};

const DEFAULT_ACCESS_SECRET: &str = "access-secret-please-change-in-production";
const DEFAULT_REFRESH_SECRET: &str = "refresh-secret-please-change-in-production";

/// JWT signing configuration
///
/// Access and refresh tokens are signed with distinct secrets so a leaked
/// access secret cannot forge refresh tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_token_secret: String,

    /// Secret for signing refresh tokens
    pub refresh_token_secret: String,

    /// Access token lifetime, e.g. "15m"
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_time: String,

    /// Refresh token lifetime, e.g. "7d"
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_time: String,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::from(DEFAULT_ACCESS_SECRET),
            refresh_token_secret: String::from(DEFAULT_REFRESH_SECRET),
            access_token_expiry_time: default_access_expiry(),
            refresh_token_expiry_time: default_refresh_expiry(),
            issuer: default_issuer(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with both secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_token_secret: access_secret.into(),
            refresh_token_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    /// Set the access token lifetime
    pub fn with_access_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.access_token_expiry_time = expiry.into();
        self
    }

    /// Set the refresh token lifetime
    pub fn with_refresh_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.refresh_token_expiry_time = expiry.into();
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Check if either secret is still the shipped default (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.access_token_secret == DEFAULT_ACCESS_SECRET
            || self.refresh_token_secret == DEFAULT_REFRESH_SECRET
    }
}

/// Login session policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionPolicyConfig {
    /// Keep at most one active refresh session per user
    #[serde(default, alias = "use_multipoint")]
    pub single_session: bool,

    /// Upper bound for a single durable store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Upper bound for a single session cache call, in milliseconds
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        Self {
            single_session: false,
            store_timeout_ms: default_store_timeout_ms(),
            cache_timeout_ms: default_cache_timeout_ms(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Session policy
    #[serde(default)]
    pub session: SessionPolicyConfig,
}

fn default_access_expiry() -> String {
    String::from("15m")
}

fn default_refresh_expiry() -> String {
    String::from("7d")
}

fn default_issuer() -> String {
    String::from("personal-blog")
}

fn default_store_timeout_ms() -> u64 {
    3000
}

fn default_cache_timeout_ms() -> u64 {
    200
}
