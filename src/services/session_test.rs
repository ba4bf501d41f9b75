use super::*;
use crate::services::auth::guest_user;

const SECRET: &str = "test-secret";

fn config() -> AuthConfig {
    AuthConfig::with_secret(SECRET)
}

// =============================================================================
// claims_for
// =============================================================================

#[test]
fn claims_copy_id_and_type_from_user() {
    let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    let user = guest_user(now);
    let claims = claims_for(&user, now, &config());
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.user_type, UserType::Guest);
    assert_eq!(claims.email, None);
    assert_eq!(claims.iat, 1_700_000_000);
    assert_eq!(claims.exp, 1_700_000_000 + 30 * 24 * 60 * 60);
}

// =============================================================================
// encode / decode
// =============================================================================

#[test]
fn issued_token_verifies_with_same_secret() {
    let user = guest_user(OffsetDateTime::now_utc());
    let token = issue(&user, &config()).unwrap();
    let claims = decode(&token, SECRET).unwrap();
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.user_type, UserType::Guest);
}

#[test]
fn wrong_secret_fails_verification() {
    let user = guest_user(OffsetDateTime::now_utc());
    let token = issue(&user, &config()).unwrap();
    assert!(decode(&token, "other-secret").is_none());
}

#[test]
fn expired_token_fails_verification() {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = SessionClaims {
        id: "guest_user_1".into(),
        user_type: UserType::Guest,
        email: None,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(&claims, SECRET).unwrap();
    assert!(decode(&token, SECRET).is_none());
}

#[test]
fn garbage_token_fails_verification() {
    assert!(decode("not-a-jwt", SECRET).is_none());
    assert!(decode("", SECRET).is_none());
}

#[test]
fn claims_serialize_type_field() {
    let claims = SessionClaims {
        id: "u".into(),
        user_type: UserType::Regular,
        email: Some("a@b.c".into()),
        iat: 0,
        exp: 1,
    };
    let value = serde_json::to_value(&claims).unwrap();
    assert_eq!(value["type"], "regular");
    assert_eq!(value["email"], "a@b.c");
}

// =============================================================================
// session_from_claims
// =============================================================================

#[test]
fn session_copies_id_and_type_into_user() {
    let claims = SessionClaims {
        id: "guest_user_42".into(),
        user_type: UserType::Guest,
        email: None,
        iat: 0,
        exp: 86_400,
    };
    let session = session_from_claims(&claims).unwrap();
    assert_eq!(session.user.id, "guest_user_42");
    assert_eq!(session.user.user_type, UserType::Guest);
    assert_eq!(session.expires, "1970-01-02T00:00:00Z");
}

#[test]
fn session_serializes_for_clients() {
    let claims = SessionClaims { id: "u1".into(), user_type: UserType::Regular, email: None, iat: 0, exp: 0 };
    let value = serde_json::to_value(session_from_claims(&claims).unwrap()).unwrap();
    assert_eq!(value["user"]["id"], "u1");
    assert_eq!(value["user"]["type"], "regular");
    assert_eq!(value["expires"], "1970-01-01T00:00:00Z");
}

#[test]
fn out_of_range_expiry_is_an_error() {
    let claims = SessionClaims { id: "u1".into(), user_type: UserType::Guest, email: None, iat: 0, exp: i64::MAX };
    assert!(matches!(session_from_claims(&claims), Err(SessionError::Expiry(_))));
}
