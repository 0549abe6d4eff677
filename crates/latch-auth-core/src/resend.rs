//! Resend email sender

use async_trait::async_trait;
use latch_types::EmailAddress;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::ResendConfig;
use crate::crypto::mask_email;
use crate::email::{EmailSender, OtpEmail};
use crate::AuthError;

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Default, Deserialize)]
struct ResendErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`EmailSender`] backed by the Resend HTTP API
#[derive(Clone)]
pub struct ResendSender {
    client: Client,
    config: ResendConfig,
    valid_minutes: u64,
}

impl ResendSender {
    /// Create a sender; `valid_minutes` is the code lifetime quoted in the message
    pub fn new(config: ResendConfig, valid_minutes: u64) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            config,
            valid_minutes,
        })
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    #[instrument(skip_all)]
    async fn send_otp(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError> {
        let message = OtpEmail::render(code, self.valid_minutes);
        let body = SendEmailRequest {
            from: &self.config.from,
            to: [to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Resend request failed");
                AuthError::DispatchFailure(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ResendErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            error!(status = %status, detail = %detail, "Resend rejected email");
            return Err(AuthError::DispatchFailure(format!("resend {}: {}", status, detail)));
        }

        let sent: SendEmailResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Resend response");
            AuthError::DispatchFailure("malformed resend response".to_string())
        })?;

        debug!(to = %mask_email(to.as_str()), message_id = %sent.id, "Verification email sent");
        Ok(())
    }
}

impl std::fmt::Debug for ResendSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendSender")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
