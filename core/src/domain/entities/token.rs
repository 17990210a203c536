//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::user::{RoleId, UserIdentity};
use crate::errors::CodecError;

/// Kind of a signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer token
    Access,
    /// Long-lived session token
    Refresh,
}

impl TokenType {
    /// Value stored in the `token_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            other => Err(format!("Invalid token type: {}", other)),
        }
    }
}

/// Claims carried by an access token
///
/// Never persisted; the signed token is the only copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Numeric user ID
    pub user_id: u64,

    /// Stable user UUID
    pub uuid: Uuid,

    /// Role at the time of issuance
    pub role_id: RoleId,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expires at (seconds since epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Builds access claims for `user`, valid for `ttl` from `now`
    ///
    /// # Arguments
    ///
    /// * `user` - The identity the token is issued to
    /// * `now` - Issuance instant
    /// * `ttl` - Token lifetime
    /// * `issuer` - Value of the `iss` claim
    ///
    /// Fails with [`CodecError::Signing`] when `now + ttl` is not representable.
    pub fn for_user(
        user: &UserIdentity,
        now: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            user_id: user.id,
            uuid: user.uuid,
            role_id: user.role_id,
            iat: now.timestamp(),
            exp: expiry_timestamp(now, ttl)?,
            iss: issuer.to_string(),
        })
    }

    /// Whether the claims are expired at `now` (a token expiring exactly now is expired)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Absolute expiry
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.exp)
    }
}

/// Claims carried by a refresh token
///
/// Unknown fields are rejected so an access token payload never decodes as a
/// refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    /// Numeric user ID
    pub user_id: u64,

    /// Session identifier, unique per login
    pub jti: Uuid,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expires at (seconds since epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl RefreshClaims {
    /// Builds refresh claims for `user`, valid for `ttl` from `now`
    pub fn for_user(
        user: &UserIdentity,
        now: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            user_id: user.id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expiry_timestamp(now, ttl)?,
            iss: issuer.to_string(),
        })
    }

    /// Whether the claims are expired at `now` (a token expiring exactly now is expired)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Absolute expiry
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.exp)
    }
}

/// Issued token record stored in the durable store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    /// Owner of the token
    pub user_id: u64,

    /// Full token value
    pub token: String,

    /// Access or refresh
    pub token_type: TokenType,

    /// When the token stops being valid
    pub expires_at: DateTime<Utc>,

    /// Revocation flag; only ever goes from false to true
    pub is_revoked: bool,

    /// Client IP at issuance
    pub ip: Option<String>,

    /// Client user agent at issuance
    pub user_agent: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl UserToken {
    /// Creates an unrevoked record
    pub fn new(
        user_id: u64,
        token: impl Into<String>,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            token: token.into(),
            token_type,
            expires_at,
            is_revoked: false,
            ip: None,
            user_agent: None,
            created_at,
        }
    }

    /// Attaches client metadata
    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }

    /// Whether the record is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Not revoked and not expired at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && !self.is_expired_at(now)
    }

    /// Marks the record revoked
    pub fn revoke(&mut self) {
        self.is_revoked = true;
    }
}

/// Durable "this token is revoked" fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Full token value
    pub token: String,

    /// After this instant the entry is meaningless and may be purged
    pub expires_at: DateTime<Utc>,

    /// Why the token was revoked
    pub reason: String,
}

impl BlacklistEntry {
    pub fn new(
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            expires_at,
            reason: reason.into(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Summary of a stored token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub user_id: u64,
    pub token_type: TokenType,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
}

impl From<&UserToken> for TokenInfo {
    fn from(record: &UserToken) -> Self {
        Self {
            user_id: record.user_id,
            token_type: record.token_type,
            expires_at: record.expires_at,
            is_revoked: record.is_revoked,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token expiry (epoch milliseconds)
    pub access_expires_at_ms: i64,

    /// Refresh token expiry (epoch milliseconds), for the HTTP cookie lifetime
    pub refresh_expires_at_ms: i64,
}

/// Result of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedAccess {
    /// Newly minted access token
    pub access_token: String,

    /// Access token expiry (epoch milliseconds)
    pub access_expires_at_ms: i64,
}

/// SHA-256 of a token value, hex encoded
///
/// Used as the unique key for token columns that are too long to index.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shortened token value safe for logs
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(10).collect();
    if prefix.len() < token.len() {
        format!("{}...", prefix)
    } else {
        String::from("***")
    }
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now + ttl` in epoch seconds, also representable in epoch milliseconds
fn expiry_timestamp(now: DateTime<Utc>, ttl: Duration) -> Result<i64, CodecError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .filter(|exp| exp.checked_mul(1000).is_some())
        .ok_or_else(|| CodecError::Signing {
            message: format!("token lifetime {} is out of range", ttl),
        })
}
