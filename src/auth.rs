use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use crate::{
    error::AppError,
    permissions::{self, Permission, Role},
    session::{SESSION_COOKIE, SessionClaims, SessionCodec},
};

/// AuthUser
///
/// The resolved identity of an authenticated request, as signed into its session
/// token. Handlers take it as an argument to learn who is acting.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    /// Role name from the token.
    pub role: String,
}

impl AuthUser {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    /// Handler-level permission check, for decisions finer than the route table.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if permissions::can_access(self.role(), permission.as_str()) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Claims already verified by the access gate are taken from the request
///    extensions.
/// 2. Otherwise (a handler mounted outside the gate, or a test calling it
///    directly) the session cookie is verified here.
///
/// Rejection: `AppError::InvalidSession` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionCodec: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(claims.clone().into());
        }

        let codec = SessionCodec::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(AppError::InvalidSession)?;

        codec.verify(&token).map(AuthUser::from)
    }
}
