use crate::{
    AppState,
    gate::{ACCESS_DENIED_PAGE, LOGIN_PAGE},
    handlers, pages,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints the gate lets through without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /login
        // Sign-in page. A visitor who already has a valid session never sees it:
        // the gate redirects them to their callback URL first.
        .route(LOGIN_PAGE, get(pages::login))
        // GET /access-denied
        .route(ACCESS_DENIED_PAGE, get(pages::access_denied))
        // POST /api/login
        // Verifies credentials and sets the signed session cookie.
        .route("/api/login", post(handlers::auth::login))
        // POST /api/logout
        // Clears the session cookie. Idempotent.
        .route("/api/logout", post(handlers::auth::logout))
}
