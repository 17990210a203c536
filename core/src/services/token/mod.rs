//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Access and refresh token signing and verification
//! - Login, refresh, logout and explicit revocation
//! - The in-process blacklist cache and its warm-up
//! - Background cleanup of expired blacklist entries

mod blacklist_cache;
mod cleanup;
mod codec;
mod config;
mod context;
mod service;

#[cfg(test)]
mod tests;

pub use blacklist_cache::BlacklistCache;
pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use codec::TokenCodec;
pub use config::TokenServiceConfig;
pub use context::RequestContext;
pub use service::{TokenService, LOGOUT_REASON, REVOKE_ALL_REASON};
