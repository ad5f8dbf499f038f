use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    error::{AppError, AppResult},
    permissions::Role,
};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "pos_session";

/// SessionSubject
///
/// The verified identity a token is issued for, produced by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSubject {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

/// SessionClaims
///
/// The payload signed into every session token. Immutable once issued and never
/// stored server-side: the signature and `exp` are the whole story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id.
    pub sub: i32,
    pub username: String,
    /// Role name as stored for the user. Kept untyped so an unknown role fails
    /// closed in the resolver instead of failing token decoding.
    pub role: String,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
    /// Absolute expiration (seconds since the epoch).
    pub exp: i64,
}

impl SessionClaims {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// SessionCodec
///
/// Issues and verifies HS256-signed session tokens with a fixed lifetime.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &SessionSubject) -> AppResult<String> {
        self.issue_at(subject, Utc::now())
    }

    /// Issues a token as if the clock read `issued_at`.
    pub fn issue_at(&self, subject: &SessionSubject, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = SessionClaims {
            sub: subject.id,
            username: subject.username.clone(),
            role: subject.role.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("session encode: {e}")))
    }

    /// Returns the decoded claims of a well-formed, correctly signed, unexpired token.
    /// Every failure collapses to `InvalidSession`.
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // The embedded expiration is the contract; no grace period.
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "session token rejected");
                AppError::InvalidSession
            })
    }
}

/// Builds the session cookie: `Path=/; HttpOnly; SameSite=Lax` (+ `Secure`).
///
/// No `Max-Age` or `Expires`: the cookie dies with the browser session, and the
/// token's own `exp` bounds it server-side.
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Builds the cookie that clears the session: empty value, already expired.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
