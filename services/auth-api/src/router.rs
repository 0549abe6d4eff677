//! Route table and middleware stack

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{self, health, ready};
use crate::state::AppState;

/// Origins allowed to make credentialed requests.
///
/// Local development hosts and any https origin are always allowed; plain
/// http is allowed only outside production.
pub fn origin_allowed(origin: &str, production: bool) -> bool {
    if origin.starts_with("https://") {
        return true;
    }
    let Some(rest) = origin.strip_prefix("http://") else {
        return false;
    };
    let host = rest.split([':', '/']).next().unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1") || !production
}

fn cors_layer(production: bool) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origin_allowed(origin, production))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
        ])
}

/// Build the HTTP router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout();

    let auth_routes = Router::new()
        .route("/otp/request", post(handlers::request_otp))
        .route("/otp/verify", post(handlers::verify_otp))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/session", get(handlers::session));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(state.config.production))
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/auth", auth_routes)
        .layer(middleware)
        .merge(health_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_allowed() {
        assert!(origin_allowed("https://app.example.com", true));
        assert!(origin_allowed("http://localhost:5173", true));
        assert!(origin_allowed("http://127.0.0.1:3000", true));
        assert!(!origin_allowed("http://app.example.com", true));
        assert!(!origin_allowed("http://localhost.evil.test", true));
        assert!(origin_allowed("http://app.example.com", false));
        assert!(!origin_allowed("ftp://app.example.com", false));
    }
}
