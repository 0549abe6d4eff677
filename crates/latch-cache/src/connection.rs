//! Redis connection management
//!
//! Wraps a lazily-established [`ConnectionManager`] with explicit state
//! tracking, bounded reconnect attempts and a health probe.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use redis::aio::ConnectionManager;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{CacheError, CacheResult};

const RECONNECT_STEP: Duration = Duration::from_millis(50);
const RECONNECT_CAP: Duration = Duration::from_secs(2);

/// Delay before reconnect attempt `attempt` (1-based): 50ms per attempt, capped at 2s
pub fn backoff_delay(attempt: u32) -> Duration {
    RECONNECT_STEP.saturating_mul(attempt).min(RECONNECT_CAP)
}

/// Redis connection settings
#[derive(Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Label attached to log lines
    pub instance_name: String,
    /// Bound on a single connect attempt. Attempts run in the background, so
    /// a command that times out first does not abort the connect.
    pub connect_timeout: Duration,
    /// Bound applied to each store operation
    pub command_timeout: Duration,
    /// `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl RedisConfig {
    /// Build a config from a `redis://` or `rediss://` URL with default timeouts
    pub fn from_url(url: impl Into<String>) -> CacheResult<Self> {
        let url = url.into();
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            return Err(CacheError::Configuration(
                "redis url must start with redis:// or rediss://".to_string(),
            ));
        }

        Ok(Self {
            url,
            instance_name: "latch-cache".to_string(),
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(5),
            max_reconnect_attempts: Some(10),
        })
    }

    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// URL with any credentials replaced, safe to log
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return "***".to_string();
        };
        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => self.url.clone(),
        }
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("url", &self.redacted_url())
            .field("instance_name", &self.instance_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("command_timeout", &self.command_timeout)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .finish()
    }
}

/// Lifecycle of the managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
    Error,
}

/// Result of a PING probe
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub state: ConnectionState,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Connect progress published to every caller waiting on a connection
#[derive(Clone)]
enum Slot {
    Idle,
    Connecting,
    Ready(ConnectionManager),
    Failed(String),
}

struct Shared {
    client: redis::Client,
    config: RedisConfig,
    slot: watch::Sender<Slot>,
    state: RwLock<ConnectionState>,
    reconnect_attempts: AtomicU32,
    shutdown: AtomicBool,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    async fn connect_with_retry(&self) -> CacheResult<ConnectionManager> {
        let mut attempt: u32 = 0;

        loop {
            if self.is_shutting_down() {
                return Err(CacheError::ShuttingDown);
            }
            self.set_state(if attempt == 0 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            });

            let last_error = match tokio::time::timeout(
                self.config.connect_timeout,
                ConnectionManager::new(self.client.clone()),
            )
            .await
            {
                Ok(Ok(conn)) => {
                    self.set_state(ConnectionState::Connected);
                    self.reconnect_attempts.store(0, Ordering::Relaxed);
                    info!(
                        instance = %self.config.instance_name,
                        url = %self.config.redacted_url(),
                        "Connected to Redis"
                    );
                    return Ok(conn);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("connect timed out after {:?}", self.config.connect_timeout),
            };

            attempt = attempt.saturating_add(1);
            self.reconnect_attempts.store(attempt, Ordering::Relaxed);

            if self.is_shutting_down() {
                return Err(CacheError::ShuttingDown);
            }

            if let Some(max) = self.config.max_reconnect_attempts {
                if attempt > max {
                    self.set_state(ConnectionState::Error);
                    error!(
                        instance = %self.config.instance_name,
                        attempts = attempt,
                        max_attempts = max,
                        error = %last_error,
                        "Max Redis reconnection attempts reached"
                    );
                    return Err(CacheError::Connection(last_error));
                }
            }

            let delay = backoff_delay(attempt);
            warn!(
                instance = %self.config.instance_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "Reconnecting to Redis"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Shared Redis connection with lazy connect and bounded reconnects
pub struct RedisConnection {
    shared: Arc<Shared>,
}

impl RedisConnection {
    /// Create the manager without connecting
    pub fn new(config: RedisConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| CacheError::Configuration(e.to_string()))?;
        let (slot, _) = watch::channel(Slot::Idle);

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                config,
                slot,
                state: RwLock::new(ConnectionState::Disconnected),
                reconnect_attempts: AtomicU32::new(0),
                shutdown: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Failed attempts since the last successful connect
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.is_shutting_down()
    }

    /// Get a handle to the live connection, connecting first if needed.
    ///
    /// The connect runs on its own task: concurrent callers wait on the same
    /// attempt, and a caller that gives up early does not cancel it. The
    /// returned handle is a cheap clone.
    pub async fn connection(&self) -> CacheResult<ConnectionManager> {
        if self.is_shutting_down() {
            return Err(CacheError::ShuttingDown);
        }

        let mut progress = self.shared.slot.subscribe();

        let mut start = false;
        self.shared.slot.send_if_modified(|slot| match slot {
            Slot::Idle | Slot::Failed(_) => {
                *slot = Slot::Connecting;
                start = true;
                true
            }
            Slot::Connecting | Slot::Ready(_) => false,
        });
        if start {
            self.spawn_connect();
        }

        let slot = progress
            .wait_for(|slot| !matches!(slot, Slot::Connecting))
            .await
            .map_err(|_| CacheError::ShuttingDown)?;

        match &*slot {
            Slot::Ready(conn) => Ok(conn.clone()),
            Slot::Failed(reason) => Err(CacheError::Connection(reason.clone())),
            Slot::Idle | Slot::Connecting => Err(CacheError::ShuttingDown),
        }
    }

    fn spawn_connect(&self) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = shared.connect_with_retry().await;
            shared.slot.send_if_modified(|slot| {
                // Shutdown resets the slot; never resurrect it
                if !matches!(slot, Slot::Connecting) {
                    return false;
                }
                *slot = match outcome {
                    Ok(conn) => Slot::Ready(conn),
                    Err(e) => Slot::Failed(e.to_string()),
                };
                true
            });
        });
    }

    /// Establish the connection eagerly
    pub async fn connect(&self) -> CacheResult<()> {
        self.connection().await.map(|_| ())
    }

    /// Record a failed command against the live connection
    pub fn mark_failed(&self, err: &CacheError) {
        if self.is_shutting_down() {
            return;
        }
        if err.is_unavailable() {
            self.shared.set_state(ConnectionState::Error);
        }
        warn!(instance = %self.shared.config.instance_name, error = %err, "Redis command failed");
    }

    /// Record a successful command, clearing a previous error state
    pub fn mark_ready(&self) {
        if self.state() == ConnectionState::Error {
            self.shared.set_state(ConnectionState::Connected);
            info!(instance = %self.shared.config.instance_name, "Redis connection recovered");
        }
    }

    /// Probe the connection with PING
    pub async fn health_check(&self) -> HealthCheck {
        let started = Instant::now();
        let command_timeout = self.shared.config.command_timeout;

        let probe = async {
            let mut conn = self.connection().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, CacheError>(pong)
        };

        let outcome = match tokio::time::timeout(command_timeout, probe).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(command_timeout)),
        };

        match outcome {
            Ok(_) => {
                self.mark_ready();
                HealthCheck {
                    state: self.state(),
                    connected: true,
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                    error: None,
                }
            }
            Err(e) => {
                self.mark_failed(&e);
                HealthCheck {
                    state: self.state(),
                    connected: false,
                    latency_ms: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Stop accepting commands and drop the connection
    pub async fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.set_state(ConnectionState::Disconnecting);
        self.shared.slot.send_replace(Slot::Idle);
        self.shared.set_state(ConnectionState::Disconnected);

        info!(instance = %self.shared.config.instance_name, "Redis connection closed");
    }
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnection")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}
