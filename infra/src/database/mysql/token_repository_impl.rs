//! MySQL implementation of the TokenRepository trait.
//!
//! Token records and blacklist entries keep the full token value (it is
//! needed to rebuild the in-process blacklist) and are keyed by its SHA-256
//! digest. The `users` table is read to resolve token subjects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use blog_core::domain::entities::token::{
    hash_token, BlacklistEntry, TokenInfo, TokenType, UserToken,
};
use blog_core::domain::entities::user::{RoleId, UserIdentity};
use blog_core::errors::StoreError;
use blog_core::repositories::TokenRepository;

use super::{map_sqlx_error, schema};
use crate::InfrastructureError;

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the token tables if they are missing
    pub async fn ensure_schema(&self) -> Result<(), InfrastructureError> {
        for statement in schema::ALL {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Token store schema is in place");
        Ok(())
    }

    /// Convert a `user_tokens` row to a UserToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<UserToken, StoreError> {
        let decode = |e: sqlx::Error| map_sqlx_error(e, "user_tokens row");

        let token_type: String = row.try_get("token_type").map_err(decode)?;
        let token_type = token_type
            .parse::<TokenType>()
            .map_err(StoreError::unavailable)?;

        Ok(UserToken {
            user_id: row.try_get("user_id").map_err(decode)?,
            token: row.try_get("token").map_err(decode)?,
            token_type,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(decode)?,
            is_revoked: row.try_get("is_revoked").map_err(decode)?,
            ip: row.try_get("ip").map_err(decode)?,
            user_agent: row.try_get("user_agent").map_err(decode)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        })
    }

    /// Convert a `users` row to a UserIdentity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<UserIdentity, StoreError> {
        let decode = |e: sqlx::Error| map_sqlx_error(e, "users row");

        let uuid: String = row.try_get("uuid").map_err(decode)?;
        let role_id: u8 = row.try_get("role_id").map_err(decode)?;

        Ok(UserIdentity {
            id: row.try_get("id").map_err(decode)?,
            uuid: Uuid::parse_str(&uuid)
                .map_err(|e| StoreError::unavailable(format!("Invalid user UUID: {}", e)))?,
            role_id: RoleId::try_from(role_id).map_err(StoreError::unavailable)?,
            frozen: row.try_get("freeze").map_err(decode)?,
        })
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn save_user_token(&self, record: UserToken) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO user_tokens (
                user_id, token, token_hash, token_type, expires_at,
                is_revoked, ip, user_agent, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(record.user_id)
            .bind(&record.token)
            .bind(hash_token(&record.token))
            .bind(record.token_type.as_str())
            .bind(record.expires_at)
            .bind(record.is_revoked)
            .bind(&record.ip)
            .bind(&record.user_agent)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user token"))?;

        Ok(())
    }

    async fn revoke_user_token(&self, user_id: u64, token: &str) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE user_tokens
            SET is_revoked = TRUE
            WHERE token_hash = ? AND user_id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(hash_token(token))
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_user_tokens(&self, user_id: u64) -> Result<usize, StoreError> {
        let query = r#"
            UPDATE user_tokens
            SET is_revoked = TRUE
            WHERE user_id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn find_user_tokens(&self, user_id: u64) -> Result<Vec<UserToken>, StoreError> {
        let query = r#"
            SELECT user_id, token, token_type, expires_at, is_revoked, ip, user_agent, created_at
            FROM user_tokens
            WHERE user_id = ?
                AND is_revoked = FALSE
                AND expires_at > ?
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user tokens"))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn get_token_info(&self, token: &str) -> Result<Option<TokenInfo>, StoreError> {
        let query = r#"
            SELECT user_id, token, token_type, expires_at, is_revoked, ip, user_agent, created_at
            FROM user_tokens
            WHERE token_hash = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(hash_token(token))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user token"))?;

        match row {
            Some(row) => Ok(Some(TokenInfo::from(&Self::row_to_token(&row)?))),
            None => Ok(None),
        }
    }

    async fn update_token_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE user_tokens SET expires_at = ? WHERE token_hash = ?")
            .bind(expires_at)
            .bind(hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_to_blacklist(&self, entry: BlacklistEntry) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO token_blacklist (token, token_hash, expires_at, reason, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                expires_at = VALUES(expires_at),
                reason = VALUES(reason)
        "#;

        sqlx::query(query)
            .bind(&entry.token)
            .bind(hash_token(&entry.token))
            .bind(entry.expires_at)
            .bind(&entry.reason)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "blacklist entry"))?;

        debug!(reason = %entry.reason, "Blacklist entry stored");
        Ok(())
    }

    async fn is_token_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        let query = r#"
            SELECT EXISTS(
                SELECT 1 FROM token_blacklist WHERE token_hash = ? AND expires_at > ?
            ) AS blacklisted
        "#;

        let blacklisted: i64 = sqlx::query_scalar(query)
            .bind(hash_token(token))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "blacklist entry"))?;

        Ok(blacklisted == 1)
    }

    async fn clean_expired_tokens(&self) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "blacklist entries"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn get_all_blacklisted_tokens(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT token FROM token_blacklist WHERE expires_at > ?")
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "blacklist entries"))
    }

    async fn get_user_by_id(&self, id: u64) -> Result<UserIdentity, StoreError> {
        let row = sqlx::query("SELECT id, uuid, role_id, freeze FROM users WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "user"))?;

        match row {
            Some(row) => Self::row_to_user(&row),
            None => Err(StoreError::not_found(format!("user {}", id))),
        }
    }
}
