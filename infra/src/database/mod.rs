//! Database module - MySQL implementations using SQLx
//!
//! This module provides the durable token store:
//! - Connection pool management
//! - The `TokenRepository` implementation and its schema

pub mod connection;
pub mod mysql;


// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::MySqlTokenRepository;
