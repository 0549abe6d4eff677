//! Normalized email addresses

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Longest address accepted (RFC 5321 path limit)
const MAX_EMAIL_LEN: usize = 254;

/// Email address normalized to lowercase with surrounding whitespace removed.
///
/// Every operation that touches the identity provider or the OTP cache works
/// on this form, so `otp:<email>` keys never differ only by case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse and normalize an address
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypesError::InvalidEmail("empty"));
        }
        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(TypesError::InvalidEmail("too long"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidEmail("contains whitespace"));
        }

        let (local, domain) = trimmed
            .split_once('@')
            .ok_or(TypesError::InvalidEmail("missing @"))?;
        if domain.contains('@') {
            return Err(TypesError::InvalidEmail("multiple @"));
        }
        if local.is_empty() {
            return Err(TypesError::InvalidEmail("empty local part"));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(TypesError::InvalidEmail("invalid domain"));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Borrow the normalized address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain part of the address
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}
