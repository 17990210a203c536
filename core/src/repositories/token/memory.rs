//! Process-local implementation of TokenRepository
//!
//! Backs the `memory` database type and the unit tests. State lives in
//! concurrent maps; nothing survives a restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::clock::{system_clock, Clock};
use crate::domain::entities::token::{BlacklistEntry, TokenInfo, UserToken};
use crate::domain::entities::user::UserIdentity;
use crate::errors::StoreError;

use super::r#trait::TokenRepository;

/// In-memory token store
pub struct InMemoryTokenRepository {
    tokens: DashMap<String, UserToken>,
    blacklist: DashMap<String, BlacklistEntry>,
    users: DashMap<u64, UserIdentity>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTokenRepository {
    /// Create an empty repository using the wall clock
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Create an empty repository reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: DashMap::new(),
            blacklist: DashMap::new(),
            users: DashMap::new(),
            clock,
        }
    }

    /// Register or replace a user
    pub fn insert_user(&self, user: UserIdentity) {
        self.users.insert(user.id, user);
    }

    /// Remove a user; returns whether it existed
    pub fn remove_user(&self, id: u64) -> bool {
        self.users.remove(&id).is_some()
    }

    /// Set the frozen flag of a user; returns whether the user exists
    pub fn set_frozen(&self, id: u64, frozen: bool) -> bool {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.frozen = frozen;
                true
            }
            None => false,
        }
    }

    /// Stored record for a token value, revoked or not
    pub fn token_record(&self, token: &str) -> Option<UserToken> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }

    /// Number of blacklist rows, expired ones included
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }
}

impl Default for InMemoryTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save_user_token(&self, record: UserToken) -> Result<(), StoreError> {
        match self.tokens.entry(record.token.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::Constraint {
                message: String::from("Token already exists"),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn revoke_user_token(&self, user_id: u64, token: &str) -> Result<bool, StoreError> {
        match self.tokens.get_mut(token) {
            Some(mut record) if record.user_id == user_id && !record.is_revoked => {
                record.revoke();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_user_tokens(&self, user_id: u64) -> Result<usize, StoreError> {
        let mut count = 0;
        for mut record in self.tokens.iter_mut() {
            if record.user_id == user_id && !record.is_revoked {
                record.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_user_tokens(&self, user_id: u64) -> Result<Vec<UserToken>, StoreError> {
        let now = self.clock.now();
        let mut records: Vec<UserToken> = self
            .tokens
            .iter()
            .filter(|record| record.user_id == user_id && record.is_active_at(now))
            .map(|record| record.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn get_token_info(&self, token: &str) -> Result<Option<TokenInfo>, StoreError> {
        Ok(self.tokens.get(token).map(|record| TokenInfo::from(record.value())))
    }

    async fn update_token_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.tokens.get_mut(token) {
            Some(mut record) => {
                record.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_to_blacklist(&self, entry: BlacklistEntry) -> Result<(), StoreError> {
        self.blacklist.insert(entry.token.clone(), entry);
        Ok(())
    }

    async fn is_token_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self
            .blacklist
            .get(token)
            .map(|entry| !entry.is_expired_at(now))
            .unwrap_or(false))
    }

    async fn clean_expired_tokens(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let before = self.blacklist.len();
        self.blacklist.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before.saturating_sub(self.blacklist.len()))
    }

    async fn get_all_blacklisted_tokens(&self) -> Result<Vec<String>, StoreError> {
        let now = self.clock.now();
        Ok(self
            .blacklist
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn get_user_by_id(&self, id: u64) -> Result<UserIdentity, StoreError> {
        self.users
            .get(&id)
            .map(|user| user.value().clone())
            .ok_or_else(|| StoreError::not_found(format!("user {}", id)))
    }

    async fn is_token_valid(&self, token: &str) -> Result<bool, StoreError> {
        if self.is_token_blacklisted(token).await? {
            return Ok(false);
        }
        let now = self.clock.now();
        Ok(self
            .tokens
            .get(token)
            .map(|record| record.is_active_at(now))
            .unwrap_or(false))
    }
}
