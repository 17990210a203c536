//! User identity as seen by the authentication core.
//!
//! The user-management subsystem owns the user record; the token engine only
//! reads the fields below.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordinal user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoleId {
    /// Anonymous visitor
    Guest = 0,
    /// Registered user
    User = 1,
    /// Administrator
    Admin = 2,
    /// Super administrator
    SuperAdmin = 3,
}

impl RoleId {
    /// Numeric value as stored in the database and in token claims
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this role has at least the privileges of `other`
    pub fn at_least(self, other: RoleId) -> bool {
        self >= other
    }
}

impl Default for RoleId {
    fn default() -> Self {
        RoleId::User
    }
}

impl From<RoleId> for u8 {
    fn from(role: RoleId) -> Self {
        role.as_u8()
    }
}

impl TryFrom<u8> for RoleId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RoleId::Guest),
            1 => Ok(RoleId::User),
            2 => Ok(RoleId::Admin),
            3 => Ok(RoleId::SuperAdmin),
            other => Err(format!("Invalid role id: {}", other)),
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleId::Guest => write!(f, "guest"),
            RoleId::User => write!(f, "user"),
            RoleId::Admin => write!(f, "admin"),
            RoleId::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// Identity of a registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Internal numeric ID (database primary key)
    pub id: u64,

    /// Stable externally visible identifier
    pub uuid: Uuid,

    /// User role
    pub role_id: RoleId,

    /// Whether the account is frozen
    pub frozen: bool,
}

impl UserIdentity {
    /// Creates an active (not frozen) identity
    pub fn new(id: u64, uuid: Uuid, role_id: RoleId) -> Self {
        Self {
            id,
            uuid,
            role_id,
            frozen: false,
        }
    }

    /// Freezes the account
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Lifts a freeze
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Whether the account may authenticate
    pub fn is_active(&self) -> bool {
        !self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(RoleId::Guest < RoleId::User);
        assert!(RoleId::User < RoleId::Admin);
        assert!(RoleId::Admin < RoleId::SuperAdmin);
        assert!(RoleId::SuperAdmin.at_least(RoleId::Admin));
        assert!(!RoleId::User.at_least(RoleId::Admin));
    }

    #[test]
    fn test_role_numeric_conversion() {
        for value in 0u8..=3 {
            let role = RoleId::try_from(value).unwrap();
            assert_eq!(u8::from(role), value);
        }
        assert!(RoleId::try_from(4).is_err());
    }

    #[test]
    fn test_role_serializes_as_number() {
        assert_eq!(serde_json::to_string(&RoleId::Admin).unwrap(), "2");
        let role: RoleId = serde_json::from_str("3").unwrap();
        assert_eq!(role, RoleId::SuperAdmin);
        assert!(serde_json::from_str::<RoleId>("9").is_err());
    }

    #[test]
    fn test_freeze_and_unfreeze() {
        let mut user = UserIdentity::new(7, Uuid::new_v4(), RoleId::User);
        assert!(user.is_active());

        user.freeze();
        assert!(user.frozen);
        assert!(!user.is_active());

        user.unfreeze();
        assert!(user.is_active());
    }
}
