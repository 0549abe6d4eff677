//! Identity provider abstraction
//!
//! The provider is the system of record for accounts and token signing.
//! Implementations report failures as [`AuthError::ProviderRejected`] when the
//! provider declined the request and [`AuthError::ProviderUnavailable`] when
//! it could not be reached.

use async_trait::async_trait;
use latch_types::{AuthUser, EmailAddress, UserId};
use serde::Deserialize;

use crate::AuthError;

/// Session object returned by the provider on sign-in or refresh
#[derive(Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds from issuance
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish_non_exhaustive()
    }
}

/// A freshly generated one-time code, not yet delivered
#[derive(Clone)]
pub struct IssuedOtp {
    pub code: String,
    /// Account the code was issued for, when the provider reports it
    pub user_id: Option<UserId>,
}

impl std::fmt::Debug for IssuedOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedOtp")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Options for one-time code generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpOptions {
    /// Provision an account for unknown addresses
    pub should_create_user: bool,
    /// Redirect target recorded with the request
    pub redirect_to: Option<String>,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            should_create_user: true,
            redirect_to: None,
        }
    }
}

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Generate a one-time code for `email` without delivering it
    async fn generate_otp(
        &self,
        email: &EmailAddress,
        options: &OtpOptions,
    ) -> Result<IssuedOtp, AuthError>;

    /// Exchange an email and code for a session
    async fn verify_otp(&self, email: &EmailAddress, code: &str)
        -> Result<ProviderSession, AuthError>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, AuthError>;

    /// Resolve an access token to the user it was issued for
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;
}
