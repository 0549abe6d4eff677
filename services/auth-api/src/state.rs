//! Application state

use std::sync::Arc;
use std::time::Duration;

use latch_auth_core::SessionService;
use latch_cache::{ConnectionState, HealthCheck, RedisConnection};

use crate::config::Config;

/// Readiness source for the code cache
#[derive(Clone)]
pub enum CacheHealth {
    Redis(Arc<RedisConnection>),
    Memory,
}

impl CacheHealth {
    pub async fn check(&self) -> HealthCheck {
        match self {
            Self::Redis(connection) => connection.health_check().await,
            Self::Memory => HealthCheck {
                state: ConnectionState::Connected,
                connected: true,
                latency_ms: Some(0),
                error: None,
            },
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session service for sign-in, refresh and user resolution
    pub sessions: Arc<SessionService>,
    /// Cache readiness probe
    pub cache: CacheHealth,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(sessions: SessionService, cache: CacheHealth, config: Config) -> Self {
        Self {
            sessions: Arc::new(sessions),
            cache,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}
