use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{LoginRequest, LoginResponse, STATUS_ACTIVE, SessionUser},
    permissions::Role,
    session::{SessionSubject, clear_session_cookie, session_cookie},
};

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> AppResult<String> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Verify a password against a bcrypt hash. A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// login
///
/// [Public Route] Exchanges a username and password for a signed session cookie.
///
/// Unknown user, inactive user and wrong password all produce the same
/// `Invalid credentials` response.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let user = state
        .repo
        .find_user_by_username(&payload.username)
        .await?
        .filter(|user| user.status == STATUS_ACTIVE)
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or(AppError::InvalidCredentials)?;

    let role = user.role.parse::<Role>().map_err(|_| {
        tracing::warn!(username = %user.username, role = %user.role, "user has an unknown role");
        AppError::InvalidCredentials
    })?;

    let subject = SessionSubject {
        id: user.id,
        username: user.username.clone(),
        role,
    };
    let token = state.sessions.issue(&subject)?;

    tracing::info!(user_id = user.id, username = %user.username, "user signed in");

    let jar = jar.add(session_cookie(&token, state.config.env.secure_cookies()));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: SessionUser {
                id: user.id,
                username: user.username,
                role: user.role,
            },
        }),
    ))
}

/// logout
///
/// [Public Route] Clears the session cookie. Succeeds whether or not a session existed.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Session cookie cleared"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(clear_session_cookie(state.config.env.secure_cookies()));
    (jar, Json(json!({ "success": true })))
}

/// get_me
///
/// [Authenticated Route] Returns the identity carried by the current session.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = SessionUser),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_me(AuthUser { id, username, role }: AuthUser) -> Json<SessionUser> {
    Json(SessionUser { id, username, role })
}
