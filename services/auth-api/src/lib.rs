//! Latch Auth API
//!
//! Passwordless session service: emailed one-time codes are exchanged for an
//! access/refresh token pair carried in HTTP-only cookies.
//!
//! ## REST Endpoints
//!
//! - `POST /auth/otp/request` - Email a one-time code
//! - `POST /auth/otp/verify` - Exchange a code for session cookies
//! - `POST /auth/refresh` - Rotate the token pair
//! - `POST /auth/logout` - Clear session cookies
//! - `GET /auth/me` - Resolve the current user through the provider
//! - `GET /auth/session` - Validate the access token locally
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (cache connectivity)

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{build_router, origin_allowed};
