//! Domain entities representing core business objects.

pub mod token;
pub mod user;

// Re-export commonly used types
pub use token::{
    hash_token, mask_token, AccessClaims, BlacklistEntry, IssuedTokens, RefreshClaims,
    RefreshedAccess, TokenInfo, TokenType, UserToken,
};
pub use user::{RoleId, UserIdentity};
