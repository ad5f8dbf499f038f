use chrono::{Duration, Utc};
use pos_portal::{
    permissions::Role,
    session::{SESSION_COOKIE, SessionCodec, SessionSubject, clear_session_cookie, session_cookie},
};

const SECRET: &str = "test-session-secret";

fn codec() -> SessionCodec {
    SessionCodec::new(SECRET, Duration::hours(8))
}

fn cashier() -> SessionSubject {
    SessionSubject {
        id: 7,
        username: "casey".to_string(),
        role: Role::Cashier,
    }
}

#[test]
fn test_issue_then_verify_round_trip() {
    let codec = codec();
    let token = codec.issue(&cashier()).unwrap();
    let claims = codec.verify(&token).unwrap();

    assert_eq!(claims.sub, 7);
    assert_eq!(claims.username, "casey");
    assert_eq!(claims.role, "CASHIER");
    assert_eq!(claims.role(), Some(Role::Cashier));
    assert_eq!(claims.exp - claims.iat, Duration::hours(8).num_seconds());
}

#[test]
fn test_expired_token_is_rejected() {
    let codec = codec();
    let issued_at = Utc::now() - codec.ttl() * 2;
    let token = codec.issue_at(&cashier(), issued_at).unwrap();

    assert!(codec.verify(&token).is_err());
}

#[test]
fn test_tampered_signature_is_rejected() {
    let codec = codec();
    let token = codec.issue(&cashier()).unwrap();

    // Flip a character in the middle of the signature segment.
    let signature_start = token.rfind('.').unwrap() + 1;
    let flip_at = signature_start + (token.len() - signature_start) / 2;
    let mut bytes = token.into_bytes();
    bytes[flip_at] = if bytes[flip_at] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    assert!(codec.verify(&tampered).is_err());
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let other = SessionCodec::new("another-secret", Duration::hours(8));
    let token = other.issue(&cashier()).unwrap();

    assert!(codec().verify(&token).is_err());
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(codec().verify("not-a-token").is_err());
    assert!(codec().verify("").is_err());
}

#[test]
fn test_session_cookie_attributes() {
    let cookie = session_cookie("tok", false);
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(
        cookie.same_site(),
        Some(axum_extra::extract::cookie::SameSite::Lax)
    );
    assert_ne!(cookie.secure(), Some(true));
    assert!(cookie.max_age().is_none());
    assert!(cookie.expires().is_none());

    assert_eq!(session_cookie("tok", true).secure(), Some(true));
}

#[test]
fn test_clear_cookie_expires_immediately() {
    let cookie = clear_session_cookie(false);
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/"));

    let expires = cookie
        .expires_datetime()
        .expect("clearing cookie carries an absolute expiry");
    assert_eq!(expires.unix_timestamp(), 0);
}
