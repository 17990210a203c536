//! Cache module for Redis-based caching
//!
//! Provides the Redis client with retry logic and the shared session cache
//! built on it.

pub mod redis_client;
pub mod session_cache;


pub use redis_client::RedisClient;
pub use session_cache::RedisSessionCache;

// Re-export commonly used types
pub use blog_shared::config::CacheConfig;
