//! Table definitions for the token store
//!
//! Token values are JWTs and may exceed any indexable VARCHAR length, so
//! uniqueness and lookups go through the SHA-256 hex digest in `token_hash`.
//! `users` is owned by the account service; it is only created here so a
//! fresh database can boot.

pub const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        uuid CHAR(36) NOT NULL UNIQUE,
        role_id TINYINT UNSIGNED NOT NULL DEFAULT 1,
        freeze BOOLEAN NOT NULL DEFAULT FALSE,
        INDEX idx_users_freeze (freeze)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

pub const CREATE_USER_TOKENS: &str = r#"
    CREATE TABLE IF NOT EXISTS user_tokens (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        token TEXT NOT NULL,
        token_hash CHAR(64) NOT NULL,
        token_type VARCHAR(16) NOT NULL,
        expires_at DATETIME NOT NULL,
        is_revoked BOOLEAN NOT NULL DEFAULT FALSE,
        ip VARCHAR(64) NULL,
        user_agent VARCHAR(512) NULL,
        created_at DATETIME NOT NULL,
        UNIQUE KEY uk_user_tokens_hash (token_hash),
        INDEX idx_user_tokens_user (user_id, is_revoked, expires_at)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

pub const CREATE_TOKEN_BLACKLIST: &str = r#"
    CREATE TABLE IF NOT EXISTS token_blacklist (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        token TEXT NOT NULL,
        token_hash CHAR(64) NOT NULL,
        expires_at DATETIME NOT NULL,
        reason VARCHAR(255) NOT NULL DEFAULT '',
        created_at DATETIME NOT NULL,
        UNIQUE KEY uk_token_blacklist_hash (token_hash),
        INDEX idx_token_blacklist_expiry (expires_at)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

/// Statements run by `MySqlTokenRepository::ensure_schema`, in order
pub const ALL: [&str; 3] = [CREATE_USERS, CREATE_USER_TOKENS, CREATE_TOKEN_BLACKLIST];
