//! Cache errors

use std::time::Duration;

use thiserror::Error;

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Could not establish or re-establish a connection
    #[error("cache connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed a command
    #[error("cache command error: {0}")]
    Command(#[from] redis::RedisError),

    /// Operation did not complete within the configured bound
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// The connection manager has been shut down
    #[error("cache client is shutting down")]
    ShuttingDown,

    /// Invalid connection settings
    #[error("cache configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    /// Whether the failure means the backend could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::ShuttingDown => true,
            Self::Command(e) => e.is_io_error() || e.is_connection_dropped() || e.is_timeout(),
            Self::Configuration(_) => false,
        }
    }
}

/// Result alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
