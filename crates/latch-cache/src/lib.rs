//! Latch Cache - Key-value cache abstractions
//!
//! Short-lived state (one-time codes) lives behind the [`KeyValueStore`]
//! trait so the session core never depends on a concrete cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use latch_cache::{RedisConfig, RedisConnection, RedisStore};
//!
//! let connection = Arc::new(RedisConnection::new(RedisConfig::from_url("redis://localhost:6379")?)?);
//! let store = RedisStore::new(Arc::clone(&connection));
//!
//! store.set_with_ttl("otp:user@example.com", "123456", Duration::from_secs(600)).await?;
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use connection::{ConnectionState, HealthCheck, RedisConfig, RedisConnection};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::*;
