//! Session handlers (otp request/verify, refresh, logout, me, session)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use latch_auth_core::SessionCookie;
use latch_types::{AccessClaims, AuthUser, EmailAddress};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AccessToken, RefreshToken};
use crate::state::AppState;

/// Length of an emailed one-time code
const OTP_CODE_LENGTH: usize = 6;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

impl std::fmt::Debug for VerifyOtpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOtpRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: AccessClaims,
}

type CookieHeaders = AppendHeaders<[(header::HeaderName, String); 2]>;

fn set_cookies(cookies: [SessionCookie; 2]) -> CookieHeaders {
    let [access, refresh] = cookies;
    AppendHeaders([
        (header::SET_COOKIE, access.to_header_value()),
        (header::SET_COOKIE, refresh.to_header_value()),
    ])
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/otp/request
///
/// Send a one-time code to the given address
pub async fn request_otp(
    State(state): State<AppState>,
    body: Result<Json<RequestOtpRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let req = json_body(body)?;

    state.sessions.request_otp(&req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/otp/verify
///
/// Exchange an emailed code for session cookies
pub async fn verify_otp(
    State(state): State<AppState>,
    body: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(body)?;

    EmailAddress::parse(&req.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if req.code.chars().count() != OTP_CODE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "code must be exactly {} characters",
            OTP_CODE_LENGTH
        )));
    }

    let pair = state
        .sessions
        .verify_otp(&req.email, &req.code)
        .await
        .ok_or(ApiError::Unauthorized("Invalid code"))?;

    // The session stands even when the user lookup fails
    let user = state.sessions.resolve_user(&pair.access_token).await;

    Ok((
        set_cookies(state.sessions.session_cookies(&pair)),
        Json(UserResponse { user }),
    ))
}

/// POST /auth/refresh
///
/// Rotate the token pair held in the refresh cookie
pub async fn refresh(
    State(state): State<AppState>,
    RefreshToken(refresh_token): RefreshToken,
) -> ApiResult<impl IntoResponse> {
    let pair = state
        .sessions
        .refresh_session(&refresh_token)
        .await
        .ok_or(ApiError::Unauthorized("Invalid refresh token"))?;

    Ok((
        set_cookies(state.sessions.session_cookies(&pair)),
        Json(SuccessResponse { success: true }),
    ))
}

/// POST /auth/logout
///
/// Clear both session cookies; the provider session is left to expire
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        set_cookies(state.sessions.clear_session_cookies()),
        Json(SuccessResponse { success: true }),
    )
}

/// GET /auth/me
///
/// Resolve the current user through the identity provider
pub async fn me(
    State(state): State<AppState>,
    AccessToken(access_token): AccessToken,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .sessions
        .resolve_user(&access_token)
        .await
        .ok_or(ApiError::Unauthorized("Invalid token"))?;

    Ok(Json(UserResponse { user: Some(user) }))
}

/// GET /auth/session
///
/// Validate the access token locally and return its claims
pub async fn session(
    State(state): State<AppState>,
    AccessToken(access_token): AccessToken,
) -> ApiResult<Json<SessionResponse>> {
    let claims = state
        .sessions
        .verify_access_token(&access_token)
        .ok_or(ApiError::Unauthorized("Invalid token"))?;

    Ok(Json(SessionResponse { session: claims }))
}
