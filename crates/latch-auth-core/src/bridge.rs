//! Identity bridge: the only path to the identity provider
//!
//! Every call is bounded by the provider timeout. Verification, refresh and
//! user lookup collapse failures to `None`; nothing is retried here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use latch_types::{AuthUser, EmailAddress};
use tracing::{debug, warn};

use crate::crypto::{fingerprint, mask_email};
use crate::provider::{IdentityProvider, IssuedOtp, OtpOptions, ProviderSession};
use crate::AuthError;

#[derive(Clone)]
pub struct IdentityBridge {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl IdentityBridge {
    pub fn new(provider: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Identity provider timed out"
                );
                Err(AuthError::ProviderUnavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.timeout
                )))
            }
        }
    }

    /// Ask the provider for a fresh one-time code
    pub async fn request_otp(
        &self,
        email: &EmailAddress,
        options: &OtpOptions,
    ) -> Result<IssuedOtp, AuthError> {
        let result = self
            .bounded("generate_otp", self.provider.generate_otp(email, options))
            .await;

        if let Err(e) = &result {
            warn!(email = %mask_email(email.as_str()), error = %e, "Failed to request OTP");
        }
        result
    }

    /// Verify a code with the provider; `None` on any rejection
    pub async fn verify_otp(&self, email: &EmailAddress, code: &str) -> Option<ProviderSession> {
        match self
            .bounded("verify_otp", self.provider.verify_otp(email, code))
            .await
        {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(email = %mask_email(email.as_str()), error = %e, "Invalid OTP");
                None
            }
        }
    }

    /// Exchange a refresh token; `None` if expired, revoked or reused
    pub async fn refresh_session(&self, refresh_token: &str) -> Option<ProviderSession> {
        match self
            .bounded("refresh_session", self.provider.refresh_session(refresh_token))
            .await
        {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(token = %fingerprint(refresh_token), error = %e, "Failed to refresh session");
                None
            }
        }
    }

    /// Resolve an access token to its user; `None` if the provider cannot validate it
    pub async fn resolve_user(&self, access_token: &str) -> Option<AuthUser> {
        match self
            .bounded("get_user", self.provider.get_user(access_token))
            .await
        {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(token = %fingerprint(access_token), error = %e, "Failed to resolve user from access token");
                None
            }
        }
    }
}

impl std::fmt::Debug for IdentityBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityBridge")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
