//! Session and token types

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Access/refresh token pair issued together by the identity provider.
///
/// Immutable once created and never persisted server-side; the caller that
/// requested it owns it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived, sent per request)
    pub access_token: String,
    /// Refresh token (long-lived, used to mint new access tokens)
    pub refresh_token: String,
    /// Access token expiry in epoch seconds
    pub expires_at: i64,
}

impl TokenPair {
    /// Seconds until the access token expires at `now`, saturating at zero
    pub fn remaining_lifetime_at(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }

    /// Seconds until the access token expires
    pub fn remaining_lifetime(&self) -> i64 {
        self.remaining_lifetime_at(Utc::now().timestamp())
    }

    /// Whether the access token has expired at `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Claims carried by a provider-signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Provider role (e.g. "authenticated")
    #[serde(default)]
    pub role: Option<String>,
    /// Provider session identifier
    #[serde(default)]
    pub session_id: Option<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,
}

impl AccessClaims {
    /// Check if the claims are expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Get the user ID from the subject claim
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }
}
