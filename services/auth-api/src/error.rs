//! Error types for the Auth API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use latch_auth_core::AuthError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{}", .0.public_message())]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Auth(e) => e.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Self::Auth(e) = &self {
            if status.is_server_error() {
                tracing::error!(error = %e, "Internal API error");
            } else {
                tracing::warn!(error = %e, code = e.error_code(), "Auth request failed");
            }
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_use_core_status() {
        for (err, status) in [
            (AuthError::ProviderRejected("rate limited".into()), StatusCode::BAD_REQUEST),
            (AuthError::ProviderUnavailable("down".into()), StatusCode::BAD_REQUEST),
            (AuthError::CacheFailure("down".into()), StatusCode::BAD_REQUEST),
            (AuthError::DispatchFailure("bounced".into()), StatusCode::BAD_REQUEST),
            (AuthError::Configuration("no key".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::Internal("bad json".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ] {
            assert_eq!(u16::from(status), err.status_code());
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_public_message_in_body() {
        let err = ApiError::from(AuthError::ProviderUnavailable("10.0.0.7 refused".into()));
        assert_eq!(err.to_string(), "identity provider unavailable");
        assert_eq!(err.error_code(), "PROVIDER_UNAVAILABLE");
    }
}
