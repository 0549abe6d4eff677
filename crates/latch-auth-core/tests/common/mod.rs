//! Common test utilities for latch-auth-core integration tests

#![allow(dead_code)]

pub mod mock_collaborators;

#[allow(unused_imports)]
pub use mock_collaborators::{FailingStore, RecordingEmailSender, StubProvider};

use latch_auth_core::AuthConfig;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-with-at-least-32-characters";

/// Config pointing at `url` with test credentials
pub fn test_config(url: &str) -> AuthConfig {
    AuthConfig::try_new(url, "anon-key", "service-role-key", TEST_JWT_SECRET).unwrap()
}
