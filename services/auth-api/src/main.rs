//! Latch Auth API binary

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth_api::build_router;
use auth_api::config::{CacheBackend, Config};
use auth_api::state::{AppState, CacheHealth};
use axum::Router;
use latch_auth_core::{ResendSender, SessionService, SupabaseProvider};
use latch_cache::{KeyValueStore, MemoryStore, RedisConnection, RedisStore};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Interval between sweeps of expired codes in the in-memory store
const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging (RUST_LOG wins over LOG_LEVEL)
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        )?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Latch Auth API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        production = config.production,
        otp_ttl_secs = config.auth.otp_ttl.as_secs(),
        "Configuration loaded"
    );

    // Code cache
    let (store, cache_health, redis): (
        Arc<dyn KeyValueStore>,
        CacheHealth,
        Option<Arc<RedisConnection>>,
    ) = match &config.cache {
        CacheBackend::Redis(redis_config) => {
            let connection = Arc::new(RedisConnection::new(redis_config.clone())?);
            // Start without Redis; the manager keeps retrying and /ready reports it
            if let Err(e) = connection.connect().await {
                tracing::warn!(error = %e, "Redis unavailable at startup");
            }
            let store: Arc<dyn KeyValueStore> =
                Arc::new(RedisStore::new(Arc::clone(&connection)));
            (
                store,
                CacheHealth::Redis(Arc::clone(&connection)),
                Some(connection),
            )
        }
        CacheBackend::Memory => {
            tracing::warn!("Using in-memory code cache; codes are not shared between instances");
            let memory = MemoryStore::new();
            spawn_purge_task(memory.clone());
            let store: Arc<dyn KeyValueStore> = Arc::new(memory);
            (store, CacheHealth::Memory, None)
        }
    };

    // Collaborators
    let provider = SupabaseProvider::new(&config.auth)?;
    let valid_minutes = (config.auth.otp_ttl.as_secs() / 60).max(1);
    let email_sender = ResendSender::new(config.resend.clone(), valid_minutes)?;

    // Create session service
    let sessions = SessionService::new(
        &config.auth,
        Arc::new(provider),
        store,
        Arc::new(email_sender),
    )?;

    let http_addr = SocketAddr::new(config.http_host, config.http_port);

    // Create application state and router
    let state = AppState::new(sessions, cache_health, config);
    let app = build_router(state);

    run_http_server(app, http_addr).await?;

    if let Some(connection) = redis {
        connection.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn spawn_purge_task(store: MemoryStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MEMORY_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired codes");
            }
        }
    });
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
