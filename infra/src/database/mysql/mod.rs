//! MySQL implementations of the core repository traits

pub mod schema;
pub mod token_repository_impl;

pub use token_repository_impl::MySqlTokenRepository;

use blog_core::errors::StoreError;

/// Convert an SQLx failure into the store-level taxonomy
///
/// `resource` names what was being looked up, for `NotFound`.
pub(crate) fn map_sqlx_error(error: sqlx::Error, resource: &str) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::not_found(resource),
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Constraint {
            message: db.message().to_string(),
        },
        sqlx::Error::PoolTimedOut => StoreError::unavailable("connection pool timed out"),
        other => StoreError::unavailable(other),
    }
}
