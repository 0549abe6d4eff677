//! Shared fixtures for route tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_api::build_router;
use auth_api::config::{CacheBackend, Config};
use auth_api::state::{AppState, CacheHealth};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use latch_auth_core::{
    AuthConfig, AuthError, EmailSender, IdentityProvider, IssuedOtp, OtpOptions, ProviderSession,
    ResendConfig, SessionService,
};
use latch_cache::MemoryStore;
use latch_types::{AuthUser, EmailAddress, UserId};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &str = "route-test-secret-with-at-least-32-chars";
pub const CODE: &str = "482913";

/// Provider that issues a fixed code and numbered token pairs
struct FixedProvider {
    user: AuthUser,
}

fn provider_session(n: u32, user: &AuthUser) -> ProviderSession {
    ProviderSession {
        access_token: format!("access-{}", n),
        refresh_token: format!("refresh-{}", n),
        expires_in: 3600,
        token_type: Some("bearer".to_string()),
        user: Some(user.clone()),
    }
}

#[async_trait]
impl IdentityProvider for FixedProvider {
    async fn generate_otp(
        &self,
        email: &EmailAddress,
        _options: &OtpOptions,
    ) -> Result<IssuedOtp, AuthError> {
        if email.domain() == "blocked.test" {
            return Err(AuthError::ProviderRejected(
                "Signups not allowed for otp".to_string(),
            ));
        }
        Ok(IssuedOtp {
            code: CODE.to_string(),
            user_id: Some(self.user.id),
        })
    }

    async fn verify_otp(
        &self,
        _email: &EmailAddress,
        code: &str,
    ) -> Result<ProviderSession, AuthError> {
        if code == CODE {
            Ok(provider_session(1, &self.user))
        } else {
            Err(AuthError::ProviderRejected(
                "Token has expired or is invalid".to_string(),
            ))
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, AuthError> {
        if refresh_token == "refresh-1" {
            Ok(provider_session(2, &self.user))
        } else {
            Err(AuthError::ProviderRejected("Invalid Refresh Token".to_string()))
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        if access_token.starts_with("access-") {
            Ok(self.user.clone())
        } else {
            Err(AuthError::ProviderRejected("invalid JWT".to_string()))
        }
    }
}

struct NoopSender;

#[async_trait]
impl EmailSender for NoopSender {
    async fn send_otp(&self, _to: &EmailAddress, _code: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

pub fn test_app() -> Router {
    let auth =
        AuthConfig::try_new("http://localhost:54321", "anon-key", "service-role-key", SECRET)
            .unwrap();
    let config = Config {
        http_host: [127, 0, 0, 1].into(),
        http_port: 0,
        production: false,
        auth: auth.clone(),
        resend: ResendConfig::try_new("re_test", "auth@latch.test").unwrap(),
        cache: CacheBackend::Memory,
        request_timeout: Duration::from_secs(5),
    };

    let provider = FixedProvider {
        user: AuthUser::new(UserId::new(), "user@example.com"),
    };
    let sessions = SessionService::new(
        &auth,
        Arc::new(provider),
        Arc::new(MemoryStore::new()),
        Arc::new(NoopSender),
    )
    .unwrap();

    build_router(AppState::new(sessions, CacheHealth::Memory, config))
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub async fn sign_in(app: &Router) -> Response {
    let response = app
        .clone()
        .oneshot(post_json("/auth/otp/request", json!({ "email": "user@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.clone()
        .oneshot(post_json(
            "/auth/otp/verify",
            json!({ "email": "user@example.com", "code": CODE }),
        ))
        .await
        .unwrap()
}
