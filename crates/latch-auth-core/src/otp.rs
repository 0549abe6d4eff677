//! Single-use, time-bounded one-time codes on top of a key-value cache
//!
//! A code lives under `otp:<email>` until it is consumed or its TTL lapses.
//! Storing a new code for the same address replaces the old one. Consumption
//! is a single atomic compare-and-delete, so concurrent verifications of the
//! same code yield at most one success.

use std::sync::Arc;
use std::time::Duration;

use latch_cache::{CompareAndDelete, KeyValueStore};
use latch_types::EmailAddress;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_OTP_TTL;
use crate::crypto::mask_email;

/// Cache key holding the live code for `email`
pub fn cache_key(email: &EmailAddress) -> String {
    format!("otp:{}", email)
}

/// Guard enforcing single-use and expiry for one-time codes
#[derive(Clone)]
pub struct OtpGuard {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl OtpGuard {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_OTP_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `code` for `email` with the default TTL.
    ///
    /// Returns `false` when the cache write failed; the code must then not be
    /// delivered, since it could never be validated.
    pub async fn store(&self, email: &EmailAddress, code: &str) -> bool {
        self.store_with_ttl(email, code, self.ttl).await
    }

    /// Store `code` for `email`, replacing any live code
    pub async fn store_with_ttl(&self, email: &EmailAddress, code: &str, ttl: Duration) -> bool {
        match self.store.set_with_ttl(&cache_key(email), code, ttl).await {
            Ok(()) => {
                debug!(email = %mask_email(email.as_str()), ttl_secs = ttl.as_secs(), "OTP stored");
                true
            }
            Err(e) => {
                error!(email = %mask_email(email.as_str()), error = %e, "Failed to store OTP");
                false
            }
        }
    }

    /// Consume `code` for `email`.
    ///
    /// Returns `true` only for the single caller whose code matched a live
    /// entry; that entry is removed in the same step. Cache failures count as
    /// a non-match.
    pub async fn consume(&self, email: &EmailAddress, code: &str) -> bool {
        if code.is_empty() {
            return false;
        }

        let masked = mask_email(email.as_str());
        match self.store.compare_and_delete(&cache_key(email), code).await {
            Ok(CompareAndDelete::Deleted) => {
                debug!(email = %masked, "OTP consumed");
                true
            }
            Ok(CompareAndDelete::Absent) => {
                info!(email = %masked, outcome = "absent", "OTP rejected: expired, consumed or never issued");
                false
            }
            Ok(CompareAndDelete::Mismatch) => {
                info!(email = %masked, outcome = "mismatch", "OTP rejected: code does not match");
                false
            }
            Err(e) => {
                warn!(
                    email = %masked,
                    outcome = "cache_unavailable",
                    unavailable = e.is_unavailable(),
                    error = %e,
                    "OTP rejected: cache failure during consume"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for OtpGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpGuard").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latch_cache::MemoryStore;

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::parse(raw).unwrap()
    }

    #[test]
    fn test_cache_key_is_lowercase() {
        assert_eq!(cache_key(&email("User@X.com")), "otp:user@x.com");
    }

    #[tokio::test]
    async fn test_store_then_consume_once() {
        let store = MemoryStore::new();
        let guard = OtpGuard::new(Arc::new(store.clone()));
        let addr = email("user@x.com");

        assert!(guard.store(&addr, "123456").await);
        assert_eq!(store.get("otp:user@x.com").await.unwrap().as_deref(), Some("123456"));

        assert!(guard.consume(&addr, "123456").await);
        assert!(!guard.consume(&addr, "123456").await);
        assert_eq!(store.get("otp:user@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_entry() {
        let guard = OtpGuard::new(Arc::new(MemoryStore::new()));
        let addr = email("user@x.com");

        guard.store(&addr, "123456").await;
        assert!(!guard.consume(&addr, "000000").await);
        assert!(!guard.consume(&addr, "").await);
        assert!(guard.consume(&addr, "123456").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_expires_after_ttl() {
        let guard = OtpGuard::new(Arc::new(MemoryStore::new()));
        let addr = email("user@x.com");

        guard.store(&addr, "123456").await;
        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(!guard.consume(&addr, "123456").await);
    }
}
