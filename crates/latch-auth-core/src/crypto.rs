//! Log-safe representations of secrets and addresses

use sha2::{Digest, Sha256};

/// Short, stable identifier for a secret value.
///
/// The first 12 hex characters of its SHA-256 digest; enough to correlate
/// log lines, useless for recovering the value.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

/// Mask the local part of an email address for logging (`j***@example.com`)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
