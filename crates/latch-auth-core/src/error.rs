//! Auth errors

use latch_cache::CacheError;
use latch_types::TypesError;
use thiserror::Error;

/// Session core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email address failed validation
    #[error("invalid email address")]
    InvalidEmail(#[from] TypesError),

    /// The identity provider declined the operation
    #[error("{0}")]
    ProviderRejected(String),

    /// The identity provider could not be reached or timed out
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Cache unreachable or a cache operation failed
    #[error("internal cache failure")]
    CacheFailure(String),

    /// The email sender failed after the code was cached
    #[error("failed to send verification email")]
    DispatchFailure(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error.
    ///
    /// Per-request failures all read as a rejected request; only faults that
    /// a retry cannot fix are server errors.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidEmail(_)
            | Self::ProviderRejected(_)
            | Self::ProviderUnavailable(_)
            | Self::CacheFailure(_)
            | Self::DispatchFailure(_) => 400,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::ProviderRejected(_) => "PROVIDER_REJECTED",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::CacheFailure(_) => "CACHE_FAILURE",
            Self::DispatchFailure(_) => "DISPATCH_FAILURE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show end users.
    ///
    /// Provider rejections carry the provider's own wording (rate limits,
    /// malformed addresses); infrastructure detail is never exposed.
    pub fn public_message(&self) -> String {
        match self {
            Self::ProviderRejected(msg) => msg.clone(),
            Self::InvalidEmail(_) | Self::CacheFailure(_) | Self::DispatchFailure(_) => {
                self.to_string()
            }
            Self::ProviderUnavailable(_) => "identity provider unavailable".to_string(),
            Self::Configuration(_) | Self::Internal(_) => "internal error".to_string(),
        }
    }
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        Self::CacheFailure(err.to_string())
    }
}
