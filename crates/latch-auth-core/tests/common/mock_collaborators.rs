//! In-memory collaborators for session service tests

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use latch_auth_core::{
    AuthError, EmailSender, IdentityProvider, IssuedOtp, OtpOptions, ProviderSession,
};
use latch_cache::{CacheError, CacheResult, CompareAndDelete, KeyValueStore};
use latch_types::{AuthUser, EmailAddress, UserId};

/// Identity provider stub.
///
/// Accepts any code it ever issued for an address, never consuming it, so
/// tests exercise the cache as the single-use gate. Refresh tokens rotate.
#[derive(Default, Clone)]
pub struct StubProvider {
    counter: Arc<AtomicU64>,
    issued: Arc<DashMap<String, Vec<String>>>,
    refresh_tokens: Arc<DashMap<String, String>>,
    access_tokens: Arc<DashMap<String, AuthUser>>,
    users: Arc<DashMap<String, UserId>>,
    reject_generate: Arc<AtomicBool>,
    delay: Arc<Mutex<Option<Duration>>>,
    pub generate_calls: Arc<AtomicUsize>,
    pub verify_calls: Arc<AtomicUsize>,
    seen_options: Arc<DashSet<bool>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every code request as a rate-limited provider would
    pub fn reject_generate(&self) {
        self.reject_generate.store(true, Ordering::SeqCst);
    }

    /// Delay every call, to exercise provider timeouts
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Whether any code request carried `should_create_user`
    pub fn saw_should_create_user(&self, value: bool) -> bool {
        self.seen_options.contains(&value)
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn user_for(&self, email: &str) -> AuthUser {
        let id = *self.users.entry(email.to_string()).or_default();
        AuthUser::new(id, email)
    }

    fn mint_session(&self, user: AuthUser) -> ProviderSession {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let access_token = format!("access-{}", n);
        let refresh_token = format!("refresh-{}", n);

        self.access_tokens.insert(access_token.clone(), user.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), user.email.clone());

        ProviderSession {
            access_token,
            refresh_token,
            expires_in: 3600,
            token_type: Some("bearer".to_string()),
            user: Some(user),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn generate_otp(
        &self,
        email: &EmailAddress,
        options: &OtpOptions,
    ) -> Result<IssuedOtp, AuthError> {
        self.maybe_delay().await;
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_options.insert(options.should_create_user);

        if self.reject_generate.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderRejected(
                "For security purposes, you can only request this after 60 seconds".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let code = format!("{:06}", 100_000 + n % 900_000);
        self.issued
            .entry(email.as_str().to_string())
            .or_default()
            .push(code.clone());

        Ok(IssuedOtp {
            code,
            user_id: Some(self.user_for(email.as_str()).id),
        })
    }

    async fn verify_otp(
        &self,
        email: &EmailAddress,
        code: &str,
    ) -> Result<ProviderSession, AuthError> {
        self.maybe_delay().await;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let known = self
            .issued
            .get(email.as_str())
            .is_some_and(|codes| codes.iter().any(|c| c == code));
        if !known {
            return Err(AuthError::ProviderRejected(
                "Token has expired or is invalid".to_string(),
            ));
        }

        Ok(self.mint_session(self.user_for(email.as_str())))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, AuthError> {
        self.maybe_delay().await;
        match self.refresh_tokens.remove(refresh_token) {
            Some((_, email)) => Ok(self.mint_session(self.user_for(&email))),
            None => Err(AuthError::ProviderRejected(
                "Invalid Refresh Token: Refresh Token Not Found".to_string(),
            )),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        self.maybe_delay().await;
        self.access_tokens
            .get(access_token)
            .map(|u| u.value().clone())
            .ok_or_else(|| AuthError::ProviderRejected("invalid JWT".to_string()))
    }
}

/// Email sender that records every message
#[derive(Default, Clone)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::default();
        sender.fail.store(true, Ordering::SeqCst);
        sender
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Most recent code sent to `email`
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_otp(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::DispatchFailure("smtp relay refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.as_str().to_string(), code.to_string()));
        Ok(())
    }
}

/// Store whose every operation fails as if the backend were down
#[derive(Default, Clone)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn set_with_ttl(&self, _: &str, _: &str, _: Duration) -> CacheResult<()> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn get(&self, _: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _: &str) -> CacheResult<bool> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn compare_and_delete(&self, _: &str, _: &str) -> CacheResult<CompareAndDelete> {
        Err(CacheError::Connection("connection refused".to_string()))
    }
}
