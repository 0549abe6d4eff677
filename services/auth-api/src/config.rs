//! Configuration for the Auth API service.

use std::net::IpAddr;
use std::time::Duration;

use latch_auth_core::{AuthConfig, ResendConfig};
use latch_cache::RedisConfig;

/// Backend holding one-time codes
#[derive(Debug, Clone)]
pub enum CacheBackend {
    Redis(RedisConfig),
    /// Process-local map; only valid for a single instance
    Memory,
}

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address
    pub http_host: IpAddr,

    /// HTTP server port
    pub http_port: u16,

    /// Production deployment (secure cookies, https-only CORS)
    pub production: bool,

    /// Session core configuration
    pub auth: AuthConfig,

    /// Email sender configuration
    pub resend: ResendConfig,

    /// One-time code storage
    pub cache: CacheBackend,

    /// Per-request timeout
    pub request_timeout: Duration,
}

fn var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
        }
        _ => Ok(default),
    }
}

/// `APP_ENV`, falling back to `NODE_ENV`, equals `production`
fn is_production() -> bool {
    std::env::var("APP_ENV")
        .or_else(|_| std::env::var("NODE_ENV"))
        .is_ok_and(|env| env.eq_ignore_ascii_case("production"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Server
        let http_host = parse_or("HTTP_HOST", IpAddr::from([0, 0, 0, 0]))?;
        let http_port = parse_or("HTTP_PORT", 4000u16)?;
        let production = is_production();

        // Identity provider
        let supabase_url = var("SUPABASE_URL")?;
        let anon_key = var("SUPABASE_ANON_KEY")?;
        let service_role_key = var("SUPABASE_SERVICE_ROLE_KEY")?;
        let jwt_secret = var("SUPABASE_JWT_SECRET")?;

        let otp_ttl_secs: u64 = parse_or("OTP_TTL_SECS", 600)?;
        if otp_ttl_secs == 0 {
            return Err(ConfigError::Invalid("OTP_TTL_SECS"));
        }
        let provider_timeout_secs: u64 = parse_or("PROVIDER_TIMEOUT_SECS", 10)?;
        let should_create_user: bool = parse_or("OTP_SHOULD_CREATE_USER", true)?;
        let access_max_age_secs: u64 = parse_or("ACCESS_TOKEN_MAX_AGE_SECS", 3600)?;
        let refresh_max_age_secs: u64 = parse_or("REFRESH_TOKEN_MAX_AGE_SECS", 5_184_000)?;

        let mut auth = AuthConfig::try_new(supabase_url, anon_key, service_role_key, jwt_secret)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_production(production)
            .with_otp_ttl(Duration::from_secs(otp_ttl_secs))
            .with_provider_timeout(Duration::from_secs(provider_timeout_secs))
            .with_access_token_max_age(Duration::from_secs(access_max_age_secs))
            .with_refresh_token_max_age(Duration::from_secs(refresh_max_age_secs))
            .with_should_create_user(should_create_user);

        if let Ok(redirect) = var("EMAIL_REDIRECT_TO") {
            auth = auth.with_email_redirect_to(redirect);
        }
        if let Ok(audience) = var("SUPABASE_JWT_AUDIENCE") {
            auth = auth.with_jwt_audience(audience);
        }

        // Email
        let resend = ResendConfig::try_new(var("RESEND_API_KEY")?, var("EMAIL_FROM")?)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        // Cache
        let cache = match parse_or("CACHE_BACKEND", "redis".to_string())?.as_str() {
            "redis" => {
                // -1 means retry forever
                let max_attempts: i64 = parse_or("REDIS_MAX_RECONNECT_ATTEMPTS", 10)?;
                let max_attempts = match max_attempts {
                    -1 => None,
                    n => Some(u32::try_from(n).map_err(|_| {
                        ConfigError::Invalid("REDIS_MAX_RECONNECT_ATTEMPTS")
                    })?),
                };

                let redis = RedisConfig::from_url(var("REDIS_URL")?)
                    .map_err(|_| ConfigError::Invalid("REDIS_URL"))?
                    .with_instance_name("auth-api")
                    .with_max_reconnect_attempts(max_attempts);
                CacheBackend::Redis(redis)
            }
            "memory" => CacheBackend::Memory,
            _ => return Err(ConfigError::Invalid("CACHE_BACKEND")),
        };

        let request_timeout_secs: u64 = parse_or("REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            http_host,
            http_port,
            production,
            auth,
            resend,
            cache,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
