use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use chrono::Utc;
use pos_portal::{
    AppConfig, AppState, MemoryRepository, create_router,
    gate::{GateDecision, decide, login_redirect, safe_callback},
    permissions::Role,
    session::{SESSION_COOKIE, SessionClaims, SessionSubject},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

// --- TEST UTILITIES ---

fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryRepository::new()), AppConfig::default())
}

fn token_for(state: &AppState, role: Role) -> String {
    state
        .sessions
        .issue(&SessionSubject {
            id: 1,
            username: format!("{}-user", role.as_str().to_lowercase()),
            role,
        })
        .unwrap()
}

async fn send(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri).header(header::HOST, "localhost:3000");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect carries a Location header")
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn claims(role: &str) -> SessionClaims {
    let now = Utc::now().timestamp();
    SessionClaims {
        sub: 1,
        username: "someone".to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + 3600,
    }
}

// --- PURE DECISION TESTS ---

#[test]
fn test_decide_public_path_passes_without_session() {
    assert_eq!(decide("/health", None, None, None), GateDecision::Pass);
    assert_eq!(decide("/api/login", None, None, None), GateDecision::Pass);
}

#[test]
fn test_decide_unauthenticated_page_redirects_to_login() {
    assert_eq!(
        decide("/products", None, None, None),
        GateDecision::Redirect("/login?callbackUrl=/products".to_string())
    );
}

#[test]
fn test_decide_unauthenticated_api_is_unauthorized() {
    assert_eq!(decide("/api/products", None, None, None), GateDecision::Unauthorized);
    assert_eq!(decide("/api/me", None, None, None), GateDecision::Unauthorized);
}

#[test]
fn test_decide_denied_api_is_forbidden_and_denied_page_is_access_denied() {
    let cashier = claims("CASHIER");
    assert_eq!(decide("/api/users", None, Some(&cashier), None), GateDecision::Forbidden);
    assert_eq!(decide("/settings", None, Some(&cashier), None), GateDecision::AccessDenied);
}

#[test]
fn test_decide_unknown_role_fails_closed() {
    let ghost = claims("GHOST");
    assert_eq!(decide("/sales", None, Some(&ghost), None), GateDecision::AccessDenied);
    // Authentication-only routes still pass.
    assert_eq!(decide("/", None, Some(&ghost), None), GateDecision::Pass);
}

#[test]
fn test_login_redirect_encodes_query() {
    assert_eq!(
        login_redirect("/products", Some("page=2&q=a b")),
        "/login?callbackUrl=/products%3Fpage%3D2%26q%3Da+b"
    );
    assert_eq!(login_redirect("/sales", Some("")), "/login?callbackUrl=/sales");
}

#[test]
fn test_safe_callback_rejects_foreign_targets() {
    let host = Some("localhost:3000");
    assert_eq!(safe_callback(Some("callbackUrl=%2Fsales"), host), "/sales");
    assert_eq!(safe_callback(Some("callbackUrl=https%3A%2F%2Fevil.example%2Fx"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=%2F%2Fevil.example"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=%2F%5Cevil.example"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=javascript%3Aalert(1)"), host), "/");
    assert_eq!(safe_callback(None, host), "/");
    assert_eq!(
        safe_callback(Some("callbackUrl=http%3A%2F%2Flocalhost%3A3000%2Fsales%3Fday%3D1"), host),
        "/sales?day=1"
    );
}

#[test]
fn test_safe_callback_rejects_control_characters_and_collapsing_paths() {
    let host = Some("localhost:3000");
    // Browsers drop tab and newline, which would leave `//evil.example`.
    assert_eq!(safe_callback(Some("callbackUrl=%2F%09%2Fevil.example"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=%2Fx%0Ay"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=%2Fx%0D%0ASet-Cookie%3A+a%3Db"), host), "/");
    assert_eq!(safe_callback(Some("callbackUrl=%2F.%2F%2Fevil.example"), host), "/");
    // Anything kept is re-serialized into a valid header value.
    assert_eq!(safe_callback(Some("callbackUrl=%2Fsales+today"), host), "/sales%20today");
}

#[test]
fn test_login_redirect_callback_resolves_back_to_target() {
    let location = login_redirect("/products", Some("page=2&q=a b"));
    let query = location.split_once('?').map(|(_, q)| q);
    assert_eq!(safe_callback(query, None), "/products?page=2&q=a%20b");
}

// --- ROUTER TESTS ---

#[tokio::test]
async fn test_health_is_public() {
    let app = create_router(test_state());
    let response = send(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_page_gets_temporary_redirect() {
    let app = create_router(test_state());
    let response = send(&app, "/products", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?callbackUrl=/products");
}

#[tokio::test]
async fn test_unrouted_page_still_requires_session() {
    let app = create_router(test_state());
    let response = send(&app, "/no-such-page", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?callbackUrl=/no-such-page");
}

#[tokio::test]
async fn test_unauthenticated_api_gets_401_json() {
    let app = create_router(test_state());
    let response = send(&app, "/api/products", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_invalid_cookie_is_treated_as_no_session() {
    let app = create_router(test_state());
    let response = send(&app, "/api/me", Some("garbage.token.value")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, "/sales", Some("garbage.token.value")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_expired_cookie_is_rejected() {
    let state = test_state();
    let expired = state
        .sessions
        .issue_at(
            &SessionSubject {
                id: 1,
                username: "old".to_string(),
                role: Role::Admin,
            },
            Utc::now() - state.sessions.ttl() * 2,
        )
        .unwrap();
    let app = create_router(state);

    let response = send(&app, "/api/me", Some(&expired)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cashier_forbidden_from_user_api() {
    let state = test_state();
    let token = token_for(&state, Role::Cashier);
    let app = create_router(state);

    let response = send(&app, "/api/users", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Forbidden" }));
}

#[tokio::test]
async fn test_driver_gets_access_denied_page_for_settings() {
    let state = test_state();
    let token = token_for(&state, Role::DeliveryDriver);
    let app = create_router(state);

    let response = send(&app, "/settings", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(body_text(response).await.contains("Access denied"));
}

#[tokio::test]
async fn test_admin_passes_gate_for_settings() {
    let state = test_state();
    let token = token_for(&state, Role::Admin);
    let app = create_router(state);

    // No settings page is served by this backend: passing the gate means a 404.
    let response = send(&app, "/settings", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authenticated_user_reaches_me_and_home() {
    let state = test_state();
    let token = token_for(&state, Role::StockManager);
    let app = create_router(state);

    let response = send(&app, "/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["role"], "STOCK_MANAGER");

    let response = send(&app, "/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("stock_manager-user"));
}

#[tokio::test]
async fn test_login_page_with_session_redirects_to_callback() {
    let state = test_state();
    let token = token_for(&state, Role::Cashier);
    let app = create_router(state);

    let response = send(&app, "/login?callbackUrl=%2Fsales", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/sales");

    let response = send(&app, "/login", Some(&token)).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_page_rejects_open_redirect() {
    let state = test_state();
    let token = token_for(&state, Role::Cashier);
    let app = create_router(state);

    let response = send(&app, "/login?callbackUrl=https%3A%2F%2Fevil.example%2F", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_page_rejects_control_character_callbacks() {
    let state = test_state();
    let token = token_for(&state, Role::Admin);
    let app = create_router(state);

    for uri in ["/login?callbackUrl=/%09/evil.example", "/login?callbackUrl=/x%0Ay"] {
        let response = send(&app, uri, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
        assert_eq!(location(&response), "/", "{uri}");
    }
}

#[tokio::test]
async fn test_login_page_without_session_is_served() {
    let app = create_router(test_state());
    let response = send(&app, "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The sign-in API only accepts JSON bodies.
    let page = body_text(response).await;
    assert!(page.contains(r#"fetch("/api/login""#));
    assert!(page.contains(r#""Content-Type": "application/json""#));
    assert!(!page.contains(r#"action="/api/login""#));
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let app = create_router(test_state());
    let response = send(&app, "/health", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
