//! Email delivery of one-time codes

use async_trait::async_trait;
use latch_types::EmailAddress;

use crate::AuthError;

/// Delivers one-time codes to users
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send `code` to `to`.
    ///
    /// # Errors
    /// Returns [`AuthError::DispatchFailure`] if the message was not accepted.
    async fn send_otp(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError>;
}

/// Rendered verification email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OtpEmail {
    pub const SUBJECT: &'static str = "Your verification code";

    /// Render the message for `code`, valid for `valid_minutes`
    pub fn render(code: &str, valid_minutes: u64) -> Self {
        let text = format!(
            "Your verification code is {code}.\n\n\
             Enter it on the sign-in page to continue. The code expires in {valid_minutes} minutes.\n\n\
             If you didn't request this, you can safely ignore this email."
        );

        let code = escape_html(code);
        let html = format!(
            "<!doctype html>\
             <html><body style=\"font-family:sans-serif;background:#ffffff;margin:0;padding:24px\">\
             <p style=\"font-size:14px;color:#444\">Verify your identity</p>\
             <p style=\"font-size:16px;color:#111\">Enter the following code to finish signing in.</p>\
             <p style=\"font-size:32px;font-weight:700;letter-spacing:6px;background:#f4f4f5;padding:12px 16px;display:inline-block\">{code}</p>\
             <p style=\"font-size:14px;color:#444\">The code expires in {valid_minutes} minutes.</p>\
             <p style=\"font-size:12px;color:#888\">Not expecting this email? You can ignore it.</p>\
             </body></html>"
        );

        Self {
            subject: Self::SUBJECT.to_string(),
            html,
            text,
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
