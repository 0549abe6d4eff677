//! Configuration types for the session core

use std::time::Duration;

use crate::AuthError;

/// Default access-token cookie lifetime (1 hour)
pub const DEFAULT_ACCESS_TOKEN_MAX_AGE: Duration = Duration::from_secs(60 * 60);
/// Default refresh-token cookie lifetime (60 days)
pub const DEFAULT_REFRESH_TOKEN_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 60);
/// Default one-time code lifetime (10 minutes)
pub const DEFAULT_OTP_TTL: Duration = Duration::from_secs(600);

/// Session core configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Identity provider base URL (e.g., https://xyz.supabase.co)
    pub supabase_url: String,
    /// Public API key, sent with end-user requests
    pub anon_key: String,
    /// Privileged API key, used only to generate one-time codes
    pub service_role_key: String,
    /// HS256 secret the provider signs access tokens with
    pub jwt_secret: String,
    /// Expected `aud` claim; unchecked when `None`
    pub jwt_audience: Option<String>,
    /// Production deployment (controls the cookie `Secure` flag)
    pub production: bool,
    /// One-time code lifetime in the cache
    pub otp_ttl: Duration,
    /// Fallback access-token cookie lifetime
    pub access_token_max_age: Duration,
    /// Refresh-token cookie lifetime
    pub refresh_token_max_age: Duration,
    /// Upper bound on any single provider call
    pub provider_timeout: Duration,
    /// Provision unknown addresses on code request
    pub should_create_user: bool,
    /// Redirect target forwarded to the provider with code requests
    pub email_redirect_to: Option<String>,
}

impl AuthConfig {
    /// Create a config, rejecting missing provider credentials
    pub fn try_new(
        supabase_url: impl Into<String>,
        anon_key: impl Into<String>,
        service_role_key: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let supabase_url = supabase_url.into().trim_end_matches('/').to_string();
        let anon_key = anon_key.into();
        let service_role_key = service_role_key.into();
        let jwt_secret = jwt_secret.into();

        if !(supabase_url.starts_with("https://") || supabase_url.starts_with("http://")) {
            return Err(AuthError::Configuration(
                "supabase url must be an http(s) URL".to_string(),
            ));
        }
        for (name, value) in [
            ("anon key", &anon_key),
            ("service role key", &service_role_key),
            ("jwt secret", &jwt_secret),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Configuration(format!("{} must be set", name)));
            }
        }

        Ok(Self {
            supabase_url,
            anon_key,
            service_role_key,
            jwt_secret,
            jwt_audience: None,
            production: false,
            otp_ttl: DEFAULT_OTP_TTL,
            access_token_max_age: DEFAULT_ACCESS_TOKEN_MAX_AGE,
            refresh_token_max_age: DEFAULT_REFRESH_TOKEN_MAX_AGE,
            provider_timeout: Duration::from_secs(10),
            should_create_user: true,
            email_redirect_to: None,
        })
    }

    /// GoTrue REST base URL
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_jwt_audience(mut self, audience: impl Into<String>) -> Self {
        self.jwt_audience = Some(audience.into());
        self
    }

    pub fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    pub fn with_access_token_max_age(mut self, max_age: Duration) -> Self {
        self.access_token_max_age = max_age;
        self
    }

    pub fn with_refresh_token_max_age(mut self, max_age: Duration) -> Self {
        self.refresh_token_max_age = max_age;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_should_create_user(mut self, create: bool) -> Self {
        self.should_create_user = create;
        self
    }

    pub fn with_email_redirect_to(mut self, redirect: impl Into<String>) -> Self {
        self.email_redirect_to = Some(redirect.into());
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("supabase_url", &self.supabase_url)
            .field("jwt_audience", &self.jwt_audience)
            .field("production", &self.production)
            .field("otp_ttl", &self.otp_ttl)
            .field("access_token_max_age", &self.access_token_max_age)
            .field("refresh_token_max_age", &self.refresh_token_max_age)
            .field("provider_timeout", &self.provider_timeout)
            .field("should_create_user", &self.should_create_user)
            .field("email_redirect_to", &self.email_redirect_to)
            .finish_non_exhaustive()
    }
}

/// Resend email API configuration
#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// Sender address, e.g. `Acme <auth@acme.dev>`
    pub from: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.resend.com";

    pub fn try_new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self, AuthError> {
        let api_key = api_key.into();
        let from = from.into();

        if api_key.trim().is_empty() {
            return Err(AuthError::Configuration("resend api key must be set".to_string()));
        }
        if !from.contains('@') {
            return Err(AuthError::Configuration(
                "email sender address must contain '@'".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            from,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        })
    }

    /// Point the sender at a different API host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("from", &self.from)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
