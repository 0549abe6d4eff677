//! Session cookie construction and parsing
//!
//! Cookies are plain values here; the HTTP layer serializes them with
//! [`SessionCookie::to_header_value`] into `Set-Cookie` headers.

use std::fmt::Write as _;

use latch_types::TokenPair;

use crate::config::{AuthConfig, DEFAULT_ACCESS_TOKEN_MAX_AGE, DEFAULT_REFRESH_TOKEN_MAX_AGE};

/// Access token cookie name
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Refresh token cookie name
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// A cookie carrying session token material
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: &'static str,
    /// Lifetime in seconds; zero expires the cookie immediately
    pub max_age: i64,
}

impl SessionCookie {
    /// Serialize as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path={}",
            self.name,
            encode_value(&self.value),
            self.max_age,
            self.path
        );
        if self.max_age == 0 {
            header.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.secure {
            header.push_str("; Secure");
        }
        let _ = write!(header, "; SameSite={}", self.same_site.as_str());
        header
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .field("path", &self.path)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

/// Cookie attributes derived from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Set the `Secure` attribute (production deployments)
    pub secure: bool,
    /// Upper bound on the access cookie lifetime
    pub access_max_age: i64,
    pub refresh_max_age: i64,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            access_max_age: DEFAULT_ACCESS_TOKEN_MAX_AGE.as_secs() as i64,
            refresh_max_age: DEFAULT_REFRESH_TOKEN_MAX_AGE.as_secs() as i64,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            secure: config.production,
            access_max_age: config.access_token_max_age.as_secs() as i64,
            refresh_max_age: config.refresh_token_max_age.as_secs() as i64,
        }
    }
}

fn token_cookie(name: &'static str, value: String, max_age: i64, secure: bool) -> SessionCookie {
    SessionCookie {
        name,
        value,
        http_only: true,
        secure,
        same_site: SameSite::Lax,
        path: "/",
        max_age,
    }
}

/// Build the access-token cookie; `max_age` defaults to one hour
pub fn build_access_token_cookie(
    token: impl Into<String>,
    max_age: Option<i64>,
    secure: bool,
) -> SessionCookie {
    let max_age = max_age.unwrap_or(DEFAULT_ACCESS_TOKEN_MAX_AGE.as_secs() as i64);
    token_cookie(ACCESS_TOKEN_COOKIE, token.into(), max_age, secure)
}

/// Build the refresh-token cookie; `max_age` defaults to 60 days
pub fn build_refresh_token_cookie(
    token: impl Into<String>,
    max_age: Option<i64>,
    secure: bool,
) -> SessionCookie {
    let max_age = max_age.unwrap_or(DEFAULT_REFRESH_TOKEN_MAX_AGE.as_secs() as i64);
    token_cookie(REFRESH_TOKEN_COOKIE, token.into(), max_age, secure)
}

/// Both cookies for a token pair at `now`.
///
/// The access cookie lives as long as the provider says the access token
/// does, capped by the policy; the refresh cookie uses the policy's fixed
/// lifetime.
pub fn session_cookies(pair: &TokenPair, now: i64, policy: &CookiePolicy) -> [SessionCookie; 2] {
    let access_max_age = pair
        .remaining_lifetime_at(now)
        .min(policy.access_max_age.max(0));
    [
        build_access_token_cookie(
            pair.access_token.clone(),
            Some(access_max_age),
            policy.secure,
        ),
        build_refresh_token_cookie(
            pair.refresh_token.clone(),
            Some(policy.refresh_max_age),
            policy.secure,
        ),
    ]
}

/// Removal cookie for `name`
pub fn clear_cookie(name: &'static str, secure: bool) -> SessionCookie {
    token_cookie(name, String::new(), 0, secure)
}

/// Removal cookies for both session cookies
pub fn clear_session_cookies(secure: bool) -> [SessionCookie; 2] {
    [
        clear_cookie(ACCESS_TOKEN_COOKIE, secure),
        clear_cookie(REFRESH_TOKEN_COOKIE, secure),
    ]
}

/// Extract a cookie value from a `Cookie` request header
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| decode_value(value.trim()))
        .filter(|value| !value.is_empty())
}

// RFC 6265 cookie-octet, minus '%' which is reserved for escapes
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x24 | 0x26..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn encode_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for &b in value.as_bytes() {
        if is_cookie_octet(b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{:02X}", b);
        }
    }
    out
}

fn decode_value(value: &str) -> String {
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
