//! Property-based tests for token pair conversion and session cookies
//!
//! These tests verify:
//! - Token pairs expire exactly `expires_in` seconds after issuance
//! - Cookie builders always set HttpOnly and Path=/, Secure only when asked
//! - Cookie values survive Set-Cookie serialization and Cookie parsing
//! - Arbitrary input never makes token verification panic or succeed

use latch_auth_core::{
    build_access_token_cookie, build_refresh_token_cookie, cookie_value, session_cookies,
    to_token_pair_at, verify_access_token, CookiePolicy, ProviderSession, ACCESS_TOKEN_COOKIE,
};
use latch_types::TokenPair;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_session() -> impl Strategy<Value = ProviderSession> {
    ("[A-Za-z0-9._-]{10,200}", "[A-Za-z0-9_-]{8,64}", 0i64..=604_800).prop_map(
        |(access_token, refresh_token, expires_in)| ProviderSession {
            access_token,
            refresh_token,
            expires_in,
            token_type: Some("bearer".to_string()),
            user: None,
        },
    )
}

fn arb_now() -> impl Strategy<Value = i64> {
    1_500_000_000i64..2_500_000_000
}

// ============================================================================
// Token pair
// ============================================================================

proptest! {
    #[test]
    fn token_pair_expires_after_declared_lifetime(session in arb_session(), now in arb_now()) {
        let pair = to_token_pair_at(&session, now);
        prop_assert_eq!(pair.expires_at - now, session.expires_in);
        prop_assert_eq!(pair.remaining_lifetime_at(now), session.expires_in);
        prop_assert_eq!(&pair.access_token, &session.access_token);
        prop_assert_eq!(&pair.refresh_token, &session.refresh_token);
    }

    #[test]
    fn remaining_lifetime_never_negative(expires_at in arb_now(), now in arb_now()) {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at,
        };
        prop_assert!(pair.remaining_lifetime_at(now) >= 0);
        prop_assert_eq!(pair.is_expired_at(now), now >= expires_at);
    }
}

// ============================================================================
// Cookies
// ============================================================================

proptest! {
    #[test]
    fn cookie_builders_always_http_only_root_path(
        token in "[A-Za-z0-9._-]{1,100}",
        max_age in proptest::option::of(0i64..10_000_000),
        secure in any::<bool>(),
    ) {
        for cookie in [
            build_access_token_cookie(token.clone(), max_age, secure),
            build_refresh_token_cookie(token.clone(), max_age, secure),
        ] {
            prop_assert!(cookie.http_only);
            prop_assert_eq!(cookie.path, "/");
            prop_assert_eq!(cookie.secure, secure);

            let header = cookie.to_header_value();
            prop_assert!(header.contains("; HttpOnly"));
            prop_assert!(header.contains("; Path=/"));
            prop_assert_eq!(header.contains("; Secure"), secure);
        }
    }

    #[test]
    fn session_cookie_max_age_matches_pair(session in arb_session(), now in arb_now(), secure in any::<bool>()) {
        let pair = to_token_pair_at(&session, now);
        let policy = CookiePolicy::new(secure);
        let [access, refresh] = session_cookies(&pair, now, &policy);

        prop_assert_eq!(access.max_age, session.expires_in.min(policy.access_max_age));
        prop_assert_eq!(refresh.max_age, policy.refresh_max_age);
    }

    #[test]
    fn cookie_value_survives_header_serialization(value in "\\PC{1,80}") {
        let cookie = build_access_token_cookie(value.clone(), None, false);
        let header = cookie.to_header_value();
        let request_cookie = header.split("; Max-Age=").next().unwrap();

        let parsed = cookie_value(&format!("theme=dark; {}", request_cookie), ACCESS_TOKEN_COOKIE);
        prop_assert_eq!(parsed, Some(value));
    }
}

// ============================================================================
// Verification
// ============================================================================

proptest! {
    #[test]
    fn arbitrary_tokens_never_verify(token in "\\PC{0,300}") {
        prop_assert!(verify_access_token(&token, "some-shared-secret").is_none());
    }

    #[test]
    fn jwt_shaped_garbage_never_verifies(
        a in "[A-Za-z0-9_-]{5,60}",
        b in "[A-Za-z0-9_-]{5,60}",
        c in "[A-Za-z0-9_-]{5,60}",
    ) {
        let token = format!("{}.{}.{}", a, b, c);
        prop_assert!(verify_access_token(&token, "some-shared-secret").is_none());
    }
}
