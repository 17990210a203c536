//! Domain layer containing business entities.

pub mod entities;

// Re-export commonly used domain types
pub use entities::{
    AccessClaims, BlacklistEntry, IssuedTokens, RefreshClaims, RefreshedAccess, RoleId,
    TokenInfo, TokenType, UserIdentity, UserToken,
};
