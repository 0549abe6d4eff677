//! HTTP handlers

mod auth;
mod health;

pub use auth::{logout, me, refresh, request_otp, session, verify_otp};
pub use health::{health, ready};
