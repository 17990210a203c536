//! Signing and verification of access and refresh tokens
//!
//! Both kinds are HS256 JWTs, signed with distinct secrets and carrying
//! distinct claim shapes. Expiry is checked against the injected [`Clock`]
//! rather than by `jsonwebtoken`, so a token whose `exp` equals the current
//! second is already expired.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;
use crate::domain::entities::token::{AccessClaims, RefreshClaims};
use crate::errors::CodecError;

use super::config::TokenServiceConfig;

/// Tolerated skew between instances when checking `iat`
const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

trait TimeClaims {
    fn issued_at(&self) -> i64;
    fn expires(&self) -> i64;
}

impl TimeClaims for AccessClaims {
    fn issued_at(&self) -> i64 {
        self.iat
    }
    fn expires(&self) -> i64 {
        self.exp
    }
}

impl TimeClaims for RefreshClaims {
    fn issued_at(&self) -> i64 {
        self.iat
    }
    fn expires(&self) -> i64 {
        self.exp
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Token codec
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec
    ///
    /// # Arguments
    ///
    /// * `access_secret` - HMAC secret for access tokens
    /// * `refresh_secret` - HMAC secret for refresh tokens
    /// * `issuer` - Issuer written into and required from every token
    /// * `clock` - Time source for expiry checks
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        issuer: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);

        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            validation,
            clock,
        }
    }

    pub fn from_config(config: &TokenServiceConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(&config.access_secret, &config.refresh_secret, &config.issuer, clock)
    }

    pub fn encode_access(&self, claims: &AccessClaims) -> Result<String, CodecError> {
        sign(claims, &self.access.encoding)
    }

    pub fn encode_refresh(&self, claims: &RefreshClaims) -> Result<String, CodecError> {
        sign(claims, &self.refresh.encoding)
    }

    /// Verifies signature, issuer and time claims of an access token
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, CodecError> {
        let claims: AccessClaims = self.verify(token, &self.access.decoding)?;
        self.check_times(&claims)?;
        Ok(claims)
    }

    /// Verifies signature, issuer and time claims of a refresh token
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, CodecError> {
        let claims: RefreshClaims = self.verify(token, &self.refresh.decoding)?;
        self.check_times(&claims)?;
        Ok(claims)
    }

    /// Verifies signature and issuer of an access token, ignoring expiry
    pub(crate) fn peek_access(&self, token: &str) -> Result<AccessClaims, CodecError> {
        self.verify(token, &self.access.decoding)
    }

    /// Verifies signature and issuer of a refresh token, ignoring expiry
    pub(crate) fn peek_refresh(&self, token: &str) -> Result<RefreshClaims, CodecError> {
        self.verify(token, &self.refresh.decoding)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, CodecError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CodecError::InvalidSignature,
                ErrorKind::InvalidIssuer => CodecError::IssuerMismatch,
                ErrorKind::ExpiredSignature => CodecError::Expired,
                _ => CodecError::malformed(e),
            })
    }

    fn check_times<T: TimeClaims>(&self, claims: &T) -> Result<(), CodecError> {
        let now = self.clock.now();
        if claims.expires() <= now.timestamp() {
            return Err(CodecError::Expired);
        }
        if claims.issued_at() > (now + Duration::seconds(MAX_CLOCK_SKEW_SECONDS)).timestamp() {
            return Err(CodecError::malformed("issued in the future"));
        }
        if claims.issued_at() > claims.expires() {
            return Err(CodecError::malformed("issued after expiry"));
        }
        Ok(())
    }
}

fn sign<T: Serialize>(claims: &T, key: &EncodingKey) -> Result<String, CodecError> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| CodecError::Signing {
        message: e.to_string(),
    })
}
