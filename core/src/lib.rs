//! # Blog Core
//!
//! Token lifecycle and revocation logic for the blog backend.
//! This crate contains domain entities, the token service, repository and
//! cache interfaces with in-memory implementations, and the error types that
//! form the foundation of the authentication layer.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::entities::{
    AccessClaims, BlacklistEntry, IssuedTokens, RefreshClaims, RefreshedAccess, RoleId,
    TokenInfo, TokenType, UserIdentity, UserToken,
};
pub use errors::{CodecError, DomainError, DomainResult, StoreError, TokenError};
pub use repositories::{
    InMemorySessionCache, InMemoryTokenRepository, SessionCache, TokenRepository,
};
pub use services::{
    BlacklistCache, CleanupResult, RequestContext, TokenCleanupConfig, TokenCleanupService,
    TokenCodec, TokenService, TokenServiceConfig,
};
