//! Session service - ties together the identity bridge, the OTP guard and email delivery

use std::sync::Arc;

use chrono::Utc;
use latch_cache::KeyValueStore;
use latch_types::{AccessClaims, AuthUser, EmailAddress, TokenPair};
use tracing::{debug, error, info, warn};

use crate::{
    bridge::IdentityBridge,
    config::AuthConfig,
    cookie::{clear_session_cookies, session_cookies, CookiePolicy, SessionCookie},
    crypto::mask_email,
    email::EmailSender,
    otp::OtpGuard,
    provider::{IdentityProvider, OtpOptions},
    token::{to_token_pair, AccessTokenVerifier},
    AuthError,
};

/// Passwordless session service
///
/// Four independent operations share no state beyond the cache:
/// - request a one-time code (provider → cache → email)
/// - verify a code (provider → single-use cache gate → token pair)
/// - refresh a token pair
/// - resolve an access token to its user
pub struct SessionService {
    bridge: IdentityBridge,
    otp: OtpGuard,
    email_sender: Arc<dyn EmailSender>,
    verifier: AccessTokenVerifier,
    cookie_policy: CookiePolicy,
    otp_options: OtpOptions,
}

impl SessionService {
    /// Create a new session service
    pub fn new(
        config: &AuthConfig,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<Self, AuthError> {
        let verifier = AccessTokenVerifier::new(&config.jwt_secret, config.jwt_audience.as_deref())?;

        Ok(Self {
            bridge: IdentityBridge::new(provider, config.provider_timeout),
            otp: OtpGuard::new(store).with_ttl(config.otp_ttl),
            email_sender,
            verifier,
            cookie_policy: CookiePolicy::from_config(config),
            otp_options: OtpOptions {
                should_create_user: config.should_create_user,
                redirect_to: config.email_redirect_to.clone(),
            },
        })
    }

    // =========================================================================
    // One-time codes
    // =========================================================================

    /// Issue a one-time code to `email`.
    ///
    /// The code is cached before it is sent; if the cache write fails nothing
    /// is sent. A failed send leaves the cached code live until it expires.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = EmailAddress::parse(email)?;
        let masked = mask_email(email.as_str());

        let issued = self.bridge.request_otp(&email, &self.otp_options).await?;

        if !self.otp.store(&email, &issued.code).await {
            return Err(AuthError::CacheFailure(
                "could not persist one-time code".to_string(),
            ));
        }

        if let Err(e) = self.email_sender.send_otp(&email, &issued.code).await {
            error!(email = %masked, error = %e, "Failed to dispatch OTP email");
            return Err(match e {
                AuthError::DispatchFailure(_) => e,
                other => AuthError::DispatchFailure(other.to_string()),
            });
        }

        info!(email = %masked, "OTP issued");
        Ok(())
    }

    /// Verify a one-time code and issue a token pair.
    ///
    /// Both the provider and the cache must accept the code; the cache entry
    /// is consumed so each issued code signs in at most once.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Option<TokenPair> {
        let email = match EmailAddress::parse(email) {
            Ok(email) => email,
            Err(e) => {
                debug!(error = %e, "Rejected verification for malformed email");
                return None;
            }
        };
        let code = code.trim();
        if code.is_empty() {
            return None;
        }

        let session = self.bridge.verify_otp(&email, code).await?;

        if !self.otp.consume(&email, code).await {
            warn!(
                email = %mask_email(email.as_str()),
                "Provider accepted OTP without a live cached code"
            );
            return None;
        }

        info!(email = %mask_email(email.as_str()), "OTP verified");
        Some(to_token_pair(&session))
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Exchange a refresh token for a new token pair
    pub async fn refresh_session(&self, refresh_token: &str) -> Option<TokenPair> {
        if refresh_token.is_empty() {
            return None;
        }
        let session = self.bridge.refresh_session(refresh_token).await?;
        Some(to_token_pair(&session))
    }

    /// Resolve an access token to its user via the provider
    pub async fn resolve_user(&self, access_token: &str) -> Option<AuthUser> {
        if access_token.is_empty() {
            return None;
        }
        self.bridge.resolve_user(access_token).await
    }

    /// Verify an access token locally against the shared secret
    pub fn verify_access_token(&self, token: &str) -> Option<AccessClaims> {
        self.verifier.verify(token)
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Access and refresh cookies for `pair`
    pub fn session_cookies(&self, pair: &TokenPair) -> [SessionCookie; 2] {
        session_cookies(pair, Utc::now().timestamp(), &self.cookie_policy)
    }

    /// Cookies that remove both session cookies
    pub fn clear_session_cookies(&self) -> [SessionCookie; 2] {
        clear_session_cookies(self.cookie_policy.secure)
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("bridge", &self.bridge)
            .field("otp", &self.otp)
            .field("cookie_policy", &self.cookie_policy)
            .field("otp_options", &self.otp_options)
            .finish_non_exhaustive()
    }
}
