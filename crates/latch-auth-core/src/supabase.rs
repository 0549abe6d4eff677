//! Supabase (GoTrue) identity provider

use async_trait::async_trait;
use latch_types::{AuthUser, EmailAddress, UserId};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::config::AuthConfig;
use crate::provider::{IdentityProvider, IssuedOtp, OtpOptions, ProviderSession};
use crate::AuthError;

/// GoTrue REST client
#[derive(Clone)]
pub struct SupabaseProvider {
    client: Client,
    auth_url: String,
    anon_key: String,
    service_role_key: String,
}

#[derive(Serialize)]
struct GenerateLinkRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct LinkProperties {
    #[serde(default)]
    email_otp: Option<String>,
}

/// `generate_link` response: the user's fields plus link properties
#[derive(Debug, Deserialize)]
struct GenerateLinkResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email_otp: Option<String>,
    #[serde(default)]
    properties: Option<LinkProperties>,
}

impl GenerateLinkResponse {
    fn code(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.email_otp.as_deref())
            .or(self.email_otp.as_deref())
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct AdminUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// `GET /admin/users` page
#[derive(Debug, Default, Deserialize)]
struct AdminUsersResponse {
    #[serde(default)]
    users: Vec<AdminUser>,
}

impl AdminUsersResponse {
    /// The admin filter is a substring match; only an exact address counts
    fn find(&self, email: &EmailAddress) -> Option<&AdminUser> {
        self.users.iter().find(|user| {
            user.email
                .as_deref()
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email.as_str()))
        })
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    email: &'a str,
    token: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// GoTrue error bodies come in several shapes depending on the endpoint
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .filter(|m| !m.is_empty())
}

impl SupabaseProvider {
    /// Create a provider with a client bounded by the configured provider timeout
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.provider_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AuthError::Configuration(format!("http client: {}", e)))?;

        Ok(Self::with_client(config, client))
    }

    /// Create a provider with a caller-supplied HTTP client
    pub fn with_client(config: &AuthConfig, client: Client) -> Self {
        Self {
            client,
            auth_url: config.auth_url(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn post(&self, path: &str, key: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.auth_url, path))
            .header("apikey", key)
    }

    /// Look up an existing account by address without provisioning one
    async fn find_user(&self, email: &EmailAddress) -> Result<Option<UserId>, AuthError> {
        let request = self
            .client
            .get(format!("{}/admin/users", self.auth_url))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .query(&[("filter", email.as_str()), ("page", "1"), ("per_page", "50")]);
        let page: AdminUsersResponse = self.send(request, "find_user").await?;

        page.find(email)
            .map(|user| UserId::parse(&user.id))
            .transpose()
            .map_err(|e| AuthError::Internal(format!("malformed user id: {}", e)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, AuthError> {
        let response = request.send().await.map_err(|e| {
            error!(operation, error = %e, "Supabase request failed");
            if e.is_timeout() {
                AuthError::ProviderUnavailable(format!("{} timed out", operation))
            } else {
                AuthError::ProviderUnavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                error!(operation, error = %e, "Failed to parse Supabase response");
                AuthError::Internal(format!("malformed {} response", operation))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        if status.is_client_error() {
            debug!(operation, status = %status, message = %message, "Supabase rejected request");
            Err(AuthError::ProviderRejected(message))
        } else {
            error!(operation, status = %status, message = %message, "Supabase server error");
            Err(AuthError::ProviderUnavailable(format!("{}: {}", status, message)))
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseProvider {
    #[instrument(skip_all, fields(operation = "generate_otp"))]
    async fn generate_otp(
        &self,
        email: &EmailAddress,
        options: &OtpOptions,
    ) -> Result<IssuedOtp, AuthError> {
        // generate_link provisions unknown addresses, so refuse them up front
        let existing = if options.should_create_user {
            None
        } else {
            match self.find_user(email).await? {
                Some(id) => Some(id),
                None => {
                    debug!("No account for address and signups are disabled");
                    return Err(AuthError::ProviderRejected(
                        "Signups not allowed for otp".to_string(),
                    ));
                }
            }
        };

        let body = GenerateLinkRequest {
            kind: "magiclink",
            email: email.as_str(),
            redirect_to: options.redirect_to.as_deref(),
        };

        let request = self
            .post("/admin/generate_link", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&body);
        let link: GenerateLinkResponse = self.send(request, "generate_otp").await?;

        let code = link.code().ok_or_else(|| {
            error!("generate_link response carried no email_otp");
            AuthError::Internal("provider returned no one-time code".to_string())
        })?;

        Ok(IssuedOtp {
            code: code.to_string(),
            user_id: link
                .id
                .as_deref()
                .and_then(|id| UserId::parse(id).ok())
                .or(existing),
        })
    }

    #[instrument(skip_all, fields(operation = "verify_otp"))]
    async fn verify_otp(
        &self,
        email: &EmailAddress,
        code: &str,
    ) -> Result<ProviderSession, AuthError> {
        let body = VerifyRequest {
            kind: "email",
            email: email.as_str(),
            token: code,
        };
        let request = self.post("/verify", &self.anon_key).json(&body);
        self.send(request, "verify_otp").await
    }

    #[instrument(skip_all, fields(operation = "refresh_session"))]
    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, AuthError> {
        let request = self
            .post("/token?grant_type=refresh_token", &self.anon_key)
            .json(&RefreshRequest { refresh_token });
        self.send(request, "refresh_session").await
    }

    #[instrument(skip_all, fields(operation = "get_user"))]
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let request = self
            .client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        self.send(request, "get_user").await
    }
}

impl std::fmt::Debug for SupabaseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseProvider")
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}
