//! Latch Types - Shared domain types
//!
//! This crate contains domain types used across latch services:
//! - User identity as projected from the identity provider
//! - Token pairs and access-token claims
//! - Normalized email addresses

pub mod email;
pub mod error;
pub mod session;
pub mod user;

pub use email::*;
pub use error::*;
pub use session::*;
pub use user::*;
