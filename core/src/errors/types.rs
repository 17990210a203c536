//! Error types for token handling, signing and storage
//!
//! `TokenError` is the classification handed to callers of the token service.
//! `CodecError` and `StoreError` are produced by the lower layers and never
//! leave the service unmapped.

use blog_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Classified outcome of a failed token operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token | 无效的令牌")]
    Malformed,

    #[error("Token expired | 令牌已过期")]
    Expired,

    #[error("Token revoked | 令牌已被撤销")]
    Revoked,

    #[error("User account is frozen | 用户已被冻结")]
    UserFrozen,

    #[error("User not found | 用户不存在")]
    UserNotFound,

    #[error("Internal error: {message} | 内部错误: {message}")]
    Internal { message: String },
}

impl TokenError {
    /// Create an internal error from anything displayable
    pub fn internal(message: impl std::fmt::Display) -> Self {
        TokenError::Internal {
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => error_codes::TOKEN_MALFORMED,
            TokenError::Expired => error_codes::TOKEN_EXPIRED,
            TokenError::Revoked => error_codes::TOKEN_REVOKED,
            TokenError::UserFrozen => error_codes::USER_FROZEN,
            TokenError::UserNotFound => error_codes::USER_NOT_FOUND,
            TokenError::Internal { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status the presentation layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            TokenError::Malformed | TokenError::Expired | TokenError::Revoked => 401,
            TokenError::UserNotFound => 401,
            TokenError::UserFrozen => 403,
            TokenError::Internal { .. } => 500,
        }
    }

    /// Only internal failures may succeed when retried with the same token
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenError::Internal { .. })
    }

    /// Whether the caller should start a refresh flow
    pub fn should_refresh(&self) -> bool {
        matches!(self, TokenError::Expired)
    }
}

impl IntoErrorResponse for TokenError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string(), self.status_code());
        if self.is_retryable() {
            response.add_detail("retryable", true)
        } else {
            response
        }
    }
}

impl From<TokenError> for ErrorResponse {
    fn from(error: TokenError) -> Self {
        error.to_error_response()
    }
}

impl From<CodecError> for TokenError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::Expired => TokenError::Expired,
            CodecError::Signing { message } => TokenError::Internal { message },
            CodecError::Malformed { .. }
            | CodecError::InvalidSignature
            | CodecError::IssuerMismatch => TokenError::Malformed,
        }
    }
}

impl From<StoreError> for TokenError {
    fn from(error: StoreError) -> Self {
        TokenError::Internal {
            message: error.to_string(),
        }
    }
}

/// Token encoding and decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed token: {reason}")]
    Malformed { reason: String },

    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issuer mismatch")]
    IssuerMismatch,

    #[error("Failed to sign token: {message}")]
    Signing { message: String },
}

impl CodecError {
    pub(crate) fn malformed(reason: impl std::fmt::Display) -> Self {
        CodecError::Malformed {
            reason: reason.to_string(),
        }
    }
}

/// Durable store and session cache failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out")]
    TimedOut,
}

impl StoreError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        StoreError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        StoreError::Unavailable {
            message: message.to_string(),
        }
    }

    /// Whether the failure is an I/O level condition that might clear up
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::TimedOut | StoreError::Cancelled
        )
    }
}
