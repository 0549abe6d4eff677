//! Axum extractors for session tokens

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use latch_auth_core::{cookie_value, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

use crate::error::ApiError;

/// Access token from the `access_token` cookie or a `Bearer` Authorization header
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

/// Refresh token from the `refresh_token` cookie
#[derive(Debug, Clone)]
pub struct RefreshToken(pub String);

fn request_cookie(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, name))
        .filter(|value| !value.is_empty())
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Cookie first, then Authorization header
        request_cookie(parts, ACCESS_TOKEN_COOKIE)
            .or_else(|| bearer_token(parts))
            .map(AccessToken)
            .ok_or(ApiError::Unauthorized("Not authenticated"))
    }
}

impl<S> FromRequestParts<S> for RefreshToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_cookie(parts, REFRESH_TOKEN_COOKIE)
            .map(RefreshToken)
            .ok_or(ApiError::Unauthorized("No refresh token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/auth/me");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_access_token_prefers_cookie() {
        let mut parts = request_parts(&[
            ("cookie", "theme=dark; access_token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        let AccessToken(token) = AccessToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token, "from-cookie");
    }

    #[tokio::test]
    async fn test_access_token_falls_back_to_bearer() {
        let mut parts = request_parts(&[("authorization", "Bearer from-header")]);
        let AccessToken(token) = AccessToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token, "from-header");
    }

    #[tokio::test]
    async fn test_access_token_missing() {
        let mut parts = request_parts(&[("authorization", "Basic dXNlcjpwYXNz")]);
        let err = AccessToken::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized("Not authenticated")));
    }

    #[tokio::test]
    async fn test_refresh_token_cookie_only() {
        let mut parts = request_parts(&[("authorization", "Bearer something")]);
        let err = RefreshToken::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized("No refresh token")));

        let mut parts = request_parts(&[("cookie", "refresh_token=r-1")]);
        let RefreshToken(token) = RefreshToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token, "r-1");
    }
}
