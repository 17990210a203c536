//! Unit tests for the in-memory token repository

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::clock::{Clock, FixedClock};
use crate::domain::entities::token::{BlacklistEntry, TokenType, UserToken};
use crate::domain::entities::user::{RoleId, UserIdentity};
use crate::errors::StoreError;
use crate::repositories::token::{InMemoryTokenRepository, TokenRepository};

fn fixed_repo() -> (InMemoryTokenRepository, FixedClock) {
    let clock = FixedClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    let repo = InMemoryTokenRepository::with_clock(Arc::new(clock.clone()));
    (repo, clock)
}

fn refresh_record(user_id: u64, token: &str, clock: &FixedClock) -> UserToken {
    let now = clock.now();
    UserToken::new(user_id, token, TokenType::Refresh, now + Duration::days(7), now)
}

#[tokio::test]
async fn test_save_and_get_token_info() {
    let (repo, clock) = fixed_repo();

    repo.save_user_token(refresh_record(1, "t1", &clock)).await.unwrap();

    let info = repo.get_token_info("t1").await.unwrap().unwrap();
    assert_eq!(info.user_id, 1);
    assert_eq!(info.token_type, TokenType::Refresh);
    assert!(!info.is_revoked);

    assert!(repo.get_token_info("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_token_is_constraint_violation() {
    let (repo, clock) = fixed_repo();

    repo.save_user_token(refresh_record(1, "same", &clock)).await.unwrap();
    let result = repo.save_user_token(refresh_record(1, "same", &clock)).await;

    assert!(matches!(result, Err(StoreError::Constraint { .. })));
}

#[tokio::test]
async fn test_revoke_user_token_is_idempotent() {
    let (repo, clock) = fixed_repo();
    repo.save_user_token(refresh_record(1, "t1", &clock)).await.unwrap();

    assert!(repo.revoke_user_token(1, "t1").await.unwrap());
    assert!(!repo.revoke_user_token(1, "t1").await.unwrap());
    assert!(repo.get_token_info("t1").await.unwrap().unwrap().is_revoked);

    // Other users cannot revoke the record
    repo.save_user_token(refresh_record(1, "t2", &clock)).await.unwrap();
    assert!(!repo.revoke_user_token(2, "t2").await.unwrap());
    assert!(!repo.get_token_info("t2").await.unwrap().unwrap().is_revoked);
}

#[tokio::test]
async fn test_revoke_all_user_tokens() {
    let (repo, clock) = fixed_repo();
    repo.save_user_token(refresh_record(1, "a", &clock)).await.unwrap();
    repo.save_user_token(refresh_record(1, "b", &clock)).await.unwrap();
    repo.save_user_token(refresh_record(2, "c", &clock)).await.unwrap();
    repo.revoke_user_token(1, "a").await.unwrap();

    assert_eq!(repo.revoke_all_user_tokens(1).await.unwrap(), 1);
    assert_eq!(repo.revoke_all_user_tokens(1).await.unwrap(), 0);
    assert!(repo.find_user_tokens(1).await.unwrap().is_empty());
    assert_eq!(repo.find_user_tokens(2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_user_tokens_skips_expired() {
    let (repo, clock) = fixed_repo();
    repo.save_user_token(refresh_record(1, "long", &clock)).await.unwrap();

    let now = clock.now();
    let short = UserToken::new(1, "short", TokenType::Access, now + Duration::minutes(5), now);
    repo.save_user_token(short).await.unwrap();

    assert_eq!(repo.count_user_tokens(1).await.unwrap(), 2);

    clock.advance(Duration::minutes(5));
    let active = repo.find_user_tokens(1).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token, "long");
}

#[tokio::test]
async fn test_update_token_expiry() {
    let (repo, clock) = fixed_repo();
    repo.save_user_token(refresh_record(1, "t1", &clock)).await.unwrap();

    let new_expiry = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
    assert!(repo.update_token_expiry("t1", new_expiry).await.unwrap());
    assert!(!repo.update_token_expiry("nope", new_expiry).await.unwrap());

    let info = repo.get_token_info("t1").await.unwrap().unwrap();
    assert_eq!(info.expires_at, new_expiry);
}

#[tokio::test]
async fn test_blacklist_is_idempotent() {
    let (repo, _clock) = fixed_repo();
    let expiry = Utc.timestamp_opt(1_700_003_600, 0).unwrap();

    repo.add_to_blacklist(BlacklistEntry::new("x", expiry, "first")).await.unwrap();
    repo.add_to_blacklist(BlacklistEntry::new("x", expiry, "second")).await.unwrap();

    assert!(repo.is_token_blacklisted("x").await.unwrap());
    assert_eq!(repo.blacklist_len(), 1);
    assert_eq!(repo.get_all_blacklisted_tokens().await.unwrap(), vec![String::from("x")]);
}

#[tokio::test]
async fn test_blacklist_expiry_and_cleanup() {
    let (repo, clock) = fixed_repo();
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    repo.add_to_blacklist(BlacklistEntry::new("soon", base + Duration::seconds(10), "logout"))
        .await
        .unwrap();
    repo.add_to_blacklist(BlacklistEntry::new("later", base + Duration::hours(1), "logout"))
        .await
        .unwrap();

    clock.advance(Duration::seconds(10));
    assert!(!repo.is_token_blacklisted("soon").await.unwrap());
    assert!(repo.is_token_blacklisted("later").await.unwrap());
    assert_eq!(repo.get_all_blacklisted_tokens().await.unwrap().len(), 1);

    assert_eq!(repo.clean_expired_tokens().await.unwrap(), 1);
    assert_eq!(repo.clean_expired_tokens().await.unwrap(), 0);
    assert_eq!(repo.blacklist_len(), 1);
}

#[tokio::test]
async fn test_is_token_valid() {
    let (repo, clock) = fixed_repo();
    repo.save_user_token(refresh_record(1, "ok", &clock)).await.unwrap();
    repo.save_user_token(refresh_record(1, "revoked", &clock)).await.unwrap();
    repo.save_user_token(refresh_record(1, "banned", &clock)).await.unwrap();
    repo.revoke_user_token(1, "revoked").await.unwrap();
    repo.add_to_blacklist(BlacklistEntry::new(
        "banned",
        Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
        "admin",
    ))
    .await
    .unwrap();

    assert!(repo.is_token_valid("ok").await.unwrap());
    assert!(!repo.is_token_valid("revoked").await.unwrap());
    assert!(!repo.is_token_valid("banned").await.unwrap());
    assert!(!repo.is_token_valid("unknown").await.unwrap());
}

#[tokio::test]
async fn test_user_lookup() {
    let (repo, _clock) = fixed_repo();
    let user = UserIdentity::new(9, Uuid::new_v4(), RoleId::User);
    repo.insert_user(user.clone());

    assert_eq!(repo.get_user_by_id(9).await.unwrap(), user);
    assert!(matches!(
        repo.get_user_by_id(10).await,
        Err(StoreError::NotFound { .. })
    ));

    assert!(repo.set_frozen(9, true));
    assert!(repo.get_user_by_id(9).await.unwrap().frozen);
    assert!(!repo.set_frozen(10, true));

    assert!(repo.remove_user(9));
    assert!(repo.get_user_by_id(9).await.is_err());
}
