//! Common error types

use thiserror::Error;

/// Errors raised while constructing shared domain types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// Email address failed validation
    #[error("invalid email address: {0}")]
    InvalidEmail(&'static str),
}
