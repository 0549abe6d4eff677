//! Token pair conversion and local access-token verification

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use latch_types::{AccessClaims, TokenPair};

use crate::provider::ProviderSession;
use crate::AuthError;

/// Convert a provider session into a [`TokenPair`] expiring `expires_in` seconds from now
pub fn to_token_pair(session: &ProviderSession) -> TokenPair {
    to_token_pair_at(session, Utc::now().timestamp())
}

/// Convert a provider session into a [`TokenPair`] issued at `now` (epoch seconds)
pub fn to_token_pair_at(session: &ProviderSession, now: i64) -> TokenPair {
    TokenPair {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
        expires_at: now.saturating_add(session.expires_in),
    }
}

/// HS256 verifier for provider-signed access tokens
#[derive(Clone)]
pub struct AccessTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl AccessTokenVerifier {
    /// Create a verifier for `secret`.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the secret is empty.
    pub fn new(secret: &str, audience: Option<&str>) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("jwt secret must be set".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Any failure (malformed, bad signature, expired, wrong audience) yields `None`.
    pub fn verify(&self, token: &str) -> Option<AccessClaims> {
        match decode::<AccessClaims>(token, &self.key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Access token rejected");
                None
            }
        }
    }
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("validate_aud", &self.validation.validate_aud)
            .finish_non_exhaustive()
    }
}

/// One-shot verification against a shared secret; `None` on any failure
pub fn verify_access_token(token: &str, secret: &str) -> Option<AccessClaims> {
    AccessTokenVerifier::new(secret, None).ok()?.verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn session(expires_in: i64) -> ProviderSession {
        ProviderSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in,
            token_type: Some("bearer".to_string()),
            user: None,
        }
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_to_token_pair_at() {
        let pair = to_token_pair_at(&session(3600), 1_700_000_000);
        assert_eq!(pair.access_token, "access");
        assert_eq!(pair.refresh_token, "refresh");
        assert_eq!(pair.expires_at, 1_700_003_600);
    }

    #[test]
    fn test_to_token_pair_uses_current_time() {
        let before = Utc::now().timestamp();
        let pair = to_token_pair(&session(3600));
        let after = Utc::now().timestamp();
        assert!(pair.expires_at >= before + 3600 && pair.expires_at <= after + 3600);
    }

    #[test]
    fn test_verify_valid_token() {
        let exp = Utc::now().timestamp() + 600;
        let token = sign(
            json!({"sub": "8f14e45f-ceea-4e67-a1f0-7a7a4d1b2c3d", "email": "a@b.co", "role": "authenticated", "aud": "authenticated", "exp": exp}),
            SECRET,
        );

        let claims = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.email.as_deref(), Some("a@b.co"));
        assert!(claims.user_id().is_some());
    }

    #[test]
    fn test_verify_rejects_bad_signature() {
        let exp = Utc::now().timestamp() + 600;
        let token = sign(json!({"sub": "u", "exp": exp}), "some-other-secret");
        assert!(verify_access_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let exp = Utc::now().timestamp() - 5;
        let token = sign(json!({"sub": "u", "exp": exp}), SECRET);
        assert!(verify_access_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert!(verify_access_token("not-a-jwt", SECRET).is_none());
        assert!(verify_access_token("", SECRET).is_none());
    }

    #[test]
    fn test_audience_enforced_when_configured() {
        let exp = Utc::now().timestamp() + 600;
        let token = sign(json!({"sub": "u", "aud": "anon", "exp": exp}), SECRET);

        let verifier = AccessTokenVerifier::new(SECRET, Some("authenticated")).unwrap();
        assert!(verifier.verify(&token).is_none());

        let verifier = AccessTokenVerifier::new(SECRET, Some("anon")).unwrap();
        assert!(verifier.verify(&token).is_some());
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        assert!(matches!(
            AccessTokenVerifier::new("", None),
            Err(AuthError::Configuration(_))
        ));
    }
}
