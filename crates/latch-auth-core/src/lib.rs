//! Latch Auth Core - Passwordless session issuance
//!
//! One-time-passcode sign-in on top of an external identity provider:
//! code issuance and single-use verification against a key-value cache,
//! token pair conversion, refresh, and session cookie construction.

pub mod bridge;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod email;
pub mod error;
pub mod otp;
pub mod provider;
pub mod resend;
pub mod service;
pub mod supabase;
pub mod token;

pub use bridge::IdentityBridge;
pub use config::{AuthConfig, ResendConfig};
pub use cookie::*;
pub use crypto::{fingerprint, mask_email};
pub use email::{EmailSender, OtpEmail};
pub use error::AuthError;
pub use otp::OtpGuard;
pub use provider::{IdentityProvider, IssuedOtp, OtpOptions, ProviderSession};
pub use resend::ResendSender;
pub use service::SessionService;
pub use supabase::SupabaseProvider;
pub use token::*;
