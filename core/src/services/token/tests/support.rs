//! Shared fixtures and store doubles for token service tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::clock::FixedClock;
use crate::domain::entities::token::{BlacklistEntry, TokenInfo, UserToken};
use crate::domain::entities::user::{RoleId, UserIdentity};
use crate::errors::StoreError;
use crate::repositories::{
    InMemorySessionCache, InMemoryTokenRepository, SessionCache, TokenRepository,
};
use crate::services::token::{TokenService, TokenServiceConfig};

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn config(single_session: bool) -> TokenServiceConfig {
    TokenServiceConfig::new(ACCESS_SECRET, REFRESH_SECRET).with_single_session(single_session)
}

pub fn alice() -> UserIdentity {
    UserIdentity::new(1, Uuid::new_v4(), RoleId::User)
}

/// Service over in-memory adapters sharing one fixed clock
pub struct Harness {
    pub service: TokenService<StoreDouble, InMemorySessionCache>,
    pub store: Arc<StoreDouble>,
    pub sessions: Arc<InMemorySessionCache>,
    pub clock: FixedClock,
    pub user: UserIdentity,
}

pub fn harness(single_session: bool) -> Harness {
    harness_with(config(single_session))
}

pub fn harness_with(config: TokenServiceConfig) -> Harness {
    let clock = FixedClock::new(start_time());
    let store = Arc::new(StoreDouble::new(InMemoryTokenRepository::with_clock(Arc::new(
        clock.clone(),
    ))));
    let sessions = Arc::new(InMemorySessionCache::new());
    let user = alice();
    store.inner.insert_user(user.clone());

    let service = TokenService::with_clock(
        Arc::clone(&store),
        Arc::clone(&sessions),
        config,
        Arc::new(clock.clone()),
    )
    .unwrap();

    Harness {
        service,
        store,
        sessions,
        clock,
        user,
    }
}

/// Injected store failures
#[derive(Default)]
pub struct Faults {
    pub fail_save: AtomicBool,
    pub fail_blacklist: AtomicBool,
    pub fail_revoke: AtomicBool,
    pub fail_scan: AtomicBool,
    pub hang_user_lookup: AtomicBool,
    pub panic_on_call: AtomicBool,
}

impl Faults {
    pub fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Wraps the in-memory store, counting calls and injecting failures
pub struct StoreDouble {
    pub inner: InMemoryTokenRepository,
    pub faults: Faults,
    calls: AtomicUsize,
}

impl StoreDouble {
    pub fn new(inner: InMemoryTokenRepository) -> Self {
        Self {
            inner,
            faults: Faults::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self, operation: &str) {
        if self.faults.panic_on_call.load(Ordering::SeqCst) {
            panic!("unexpected store call: {}", operation);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn fails(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TokenRepository for StoreDouble {
    async fn save_user_token(&self, record: UserToken) -> Result<(), StoreError> {
        self.hit("save_user_token");
        Self::fails(&self.faults.fail_save)?;
        self.inner.save_user_token(record).await
    }

    async fn revoke_user_token(&self, user_id: u64, token: &str) -> Result<bool, StoreError> {
        self.hit("revoke_user_token");
        Self::fails(&self.faults.fail_revoke)?;
        self.inner.revoke_user_token(user_id, token).await
    }

    async fn revoke_all_user_tokens(&self, user_id: u64) -> Result<usize, StoreError> {
        self.hit("revoke_all_user_tokens");
        Self::fails(&self.faults.fail_revoke)?;
        self.inner.revoke_all_user_tokens(user_id).await
    }

    async fn find_user_tokens(&self, user_id: u64) -> Result<Vec<UserToken>, StoreError> {
        self.hit("find_user_tokens");
        self.inner.find_user_tokens(user_id).await
    }

    async fn get_token_info(&self, token: &str) -> Result<Option<TokenInfo>, StoreError> {
        self.hit("get_token_info");
        self.inner.get_token_info(token).await
    }

    async fn update_token_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.hit("update_token_expiry");
        self.inner.update_token_expiry(token, expires_at).await
    }

    async fn add_to_blacklist(&self, entry: BlacklistEntry) -> Result<(), StoreError> {
        self.hit("add_to_blacklist");
        Self::fails(&self.faults.fail_blacklist)?;
        self.inner.add_to_blacklist(entry).await
    }

    async fn is_token_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        self.hit("is_token_blacklisted");
        self.inner.is_token_blacklisted(token).await
    }

    async fn clean_expired_tokens(&self) -> Result<usize, StoreError> {
        self.hit("clean_expired_tokens");
        Self::fails(&self.faults.fail_scan)?;
        self.inner.clean_expired_tokens().await
    }

    async fn get_all_blacklisted_tokens(&self) -> Result<Vec<String>, StoreError> {
        self.hit("get_all_blacklisted_tokens");
        Self::fails(&self.faults.fail_scan)?;
        self.inner.get_all_blacklisted_tokens().await
    }

    async fn get_user_by_id(&self, id: u64) -> Result<UserIdentity, StoreError> {
        self.hit("get_user_by_id");
        if self.faults.hang_user_lookup.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.get_user_by_id(id).await
    }

    async fn is_token_valid(&self, token: &str) -> Result<bool, StoreError> {
        self.hit("is_token_valid");
        self.inner.is_token_valid(token).await
    }
}

/// Session cache whose backend is unreachable
pub struct UnreachableSessionCache;

#[async_trait]
impl SessionCache for UnreachableSessionCache {
    async fn set(&self, _: Uuid, _: &str, _: StdDuration) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn get(&self, _: Uuid) -> Result<Option<String>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn delete(&self, _: Uuid) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}
