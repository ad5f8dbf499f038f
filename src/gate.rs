use std::sync::LazyLock;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use regex::{Regex, RegexBuilder};
use url::Url;

use crate::{
    error::AppError,
    pages,
    permissions::{self, Permission, perm},
    session::{SESSION_COOKIE, SessionClaims, SessionCodec},
};

pub const LOGIN_PAGE: &str = "/login";
pub const ACCESS_DENIED_PAGE: &str = "/access-denied";
pub const LANDING_PAGE: &str = "/";

/// Access
///
/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, with or without a session.
    Public,
    /// Any valid session.
    Authenticated,
    /// A valid session whose role resolves this permission.
    Permission(Permission),
}

/// RouteRule
///
/// One entry of the ordered route table: an anchored, case-insensitive pattern
/// over the URL path and the access it requires.
#[derive(Debug)]
pub struct RouteRule {
    pub pattern: Regex,
    pub access: Access,
}

impl RouteRule {
    pub fn new(pattern: &str, access: Access) -> Self {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("route pattern must be a valid regex");
        Self { pattern, access }
    }
}

/// ROUTE_RULES
///
/// The route table. Evaluated top to bottom and the first match wins, so public
/// exceptions and narrow rules must sit above the broad rules that would shadow them.
pub static ROUTE_RULES: LazyLock<Vec<RouteRule>> = LazyLock::new(|| {
    use Access::{Permission as Needs, Public};

    vec![
        // Auth and static pages.
        RouteRule::new(r"^/login(/.*)?$", Public),
        RouteRule::new(r"^/access-denied(/.*)?$", Public),
        RouteRule::new(r"^/api/login(/.*)?$", Public),
        RouteRule::new(r"^/api/logout(/.*)?$", Public),
        RouteRule::new(r"^/health$", Public),
        RouteRule::new(r"^/swagger-ui(/.*)?$", Public),
        RouteRule::new(r"^/api-docs(/.*)?$", Public),
        // API endpoints.
        RouteRule::new(r"^/api/users(/.*)?$", Needs(perm::USERS_MANAGE)),
        RouteRule::new(r"^/api/products(/.*)?$", Needs(perm::PRODUCTS_MANAGE)),
        RouteRule::new(r"^/api/category(/.*)?$", Needs(perm::CATEGORIES_MANAGE)),
        RouteRule::new(r"^/api/customers?(/.*)?$", Needs(perm::CUSTOMERS_MANAGE)),
        RouteRule::new(r"^/api/deliveries(/.*)?$", Needs(perm::DELIVERIES_MANAGE)),
        RouteRule::new(r"^/api/drivers(/.*)?$", Needs(perm::DRIVERS_MANAGE)),
        RouteRule::new(r"^/api/invoices?(/.*)?$", Needs(perm::INVOICES_MANAGE)),
        RouteRule::new(r"^/api/reports(/.*)?$", Needs(perm::REPORTS_VIEW)),
        RouteRule::new(r"^/api/sales/refund(/.*)?$", Needs(perm::SALES_REFUND)),
        RouteRule::new(r"^/api/sales/report(/.*)?$", Needs(perm::SALES_REPORT)),
        RouteRule::new(r"^/api/sales?(/.*)?$", Needs(perm::SALES_CREATE)),
        RouteRule::new(r"^/api/suppliers(/.*)?$", Needs(perm::SUPPLIERS_MANAGE)),
        // Pages.
        RouteRule::new(r"^/customer-screen(/.*)?$", Needs(perm::CUSTOMERS_VIEW)),
        RouteRule::new(r"^/customers(/.*)?$", Needs(perm::CUSTOMERS_VIEW)),
        RouteRule::new(r"^/delivery(/.*)?$", Needs(perm::DELIVERIES_VIEW)),
        RouteRule::new(r"^/inventory(/.*)?$", Needs(perm::INVENTORY_VIEW)),
        RouteRule::new(r"^/products(/.*)?$", Needs(perm::PRODUCTS_VIEW)),
        RouteRule::new(r"^/reports(/.*)?$", Needs(perm::REPORTS_VIEW)),
        RouteRule::new(r"^/sales(/.*)?$", Needs(perm::SALES_VIEW)),
        RouteRule::new(r"^/drivers(/.*)?$", Needs(perm::DRIVERS_VIEW)),
        RouteRule::new(r"^/settings(/.*)?$", Needs(perm::SETTINGS_MANAGE)),
    ]
});

/// classify
///
/// Maps a path to its access requirement using [`ROUTE_RULES`]. Total: paths no
/// rule matches require an authenticated session and nothing more.
pub fn classify(path: &str) -> Access {
    classify_with(&ROUTE_RULES, path)
}

/// First-match classification over an arbitrary rule list.
pub fn classify_with(rules: &[RouteRule], path: &str) -> Access {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(path))
        .map(|rule| rule.access)
        .unwrap_or(Access::Authenticated)
}

/// GateDecision
///
/// The single terminal outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
    /// API request without a valid session.
    Unauthorized,
    /// API request whose role lacks the permission.
    Forbidden,
    /// Page request whose role lacks the permission.
    AccessDenied,
}

pub fn is_api_path(path: &str) -> bool {
    path.starts_with("/api")
}

fn is_login_page(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower == LOGIN_PAGE || lower.starts_with("/login/")
}

/// decide
///
/// Pure gate logic: classification, authentication, then authorization.
/// `session` must already be verified; `host` is the request's `Host` header,
/// used to recognise same-origin absolute callback URLs.
pub fn decide(
    path: &str,
    query: Option<&str>,
    session: Option<&SessionClaims>,
    host: Option<&str>,
) -> GateDecision {
    let access = classify(path);

    if access == Access::Public {
        if is_login_page(path) && session.is_some() {
            return GateDecision::Redirect(safe_callback(query, host));
        }
        return GateDecision::Pass;
    }

    let Some(session) = session else {
        if is_api_path(path) {
            return GateDecision::Unauthorized;
        }
        return GateDecision::Redirect(login_redirect(path, query));
    };

    match access {
        Access::Permission(required)
            if !permissions::resolve(Some(&session.role), required.as_str()) =>
        {
            if is_api_path(path) {
                GateDecision::Forbidden
            } else {
                GateDecision::AccessDenied
            }
        }
        _ => GateDecision::Pass,
    }
}

/// Login URL carrying the originally requested path and query as `callbackUrl`.
pub fn login_redirect(path: &str, query: Option<&str>) -> String {
    let target = match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };
    format!("{LOGIN_PAGE}?callbackUrl={}", encode_callback(&target))
}

// Form-encodes each path segment, keeping the '/' separators readable.
fn encode_callback(target: &str) -> String {
    target
        .split('/')
        .map(|segment| url::form_urlencoded::byte_serialize(segment.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("/")
}

// Base for resolving rooted callback paths; only its path and query are emitted.
static CALLBACK_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("callback base must parse"));

/// safe_callback
///
/// Resolves the `callbackUrl` query parameter to a same-origin location, falling
/// back to the landing page. Accepts a rooted relative path, or an absolute
/// http(s) URL whose authority equals `host`. Callbacks containing control
/// characters or backslashes are refused. The result is re-serialized by `url`,
/// so it is always a valid `Location` value.
pub fn safe_callback(query: Option<&str>, host: Option<&str>) -> String {
    let Some(callback) = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "callbackUrl")
            .map(|(_, value)| value.into_owned())
    }) else {
        return LANDING_PAGE.to_string();
    };

    if callback.chars().any(|c| c.is_control() || c == '\\') {
        return LANDING_PAGE.to_string();
    }

    let resolved = if callback.starts_with('/') && !callback.starts_with("//") {
        CALLBACK_BASE.join(&callback).ok()
    } else {
        Url::parse(&callback)
            .ok()
            .filter(|url| host.is_some_and(|host| is_same_origin(url, host)))
    };

    match resolved {
        // Dot segments can collapse to a protocol-relative path.
        Some(url) if !url.path().starts_with("//") => match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        },
        _ => LANDING_PAGE.to_string(),
    }
}

fn is_same_origin(url: &Url, host: &str) -> bool {
    let authority = match (url.host_str(), url.port()) {
        (Some(h), Some(port)) => format!("{h}:{port}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return false,
    };
    matches!(url.scheme(), "http" | "https") && authority.eq_ignore_ascii_case(host)
}

/// access_gate
///
/// Middleware run on every request. Verifies the session cookie, applies
/// [`decide`], and on pass exposes the verified claims to handlers through the
/// request extensions.
pub async fn access_gate(
    State(codec): State<SessionCodec>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|token| !token.is_empty())
        .and_then(|token| codec.verify(token).ok());

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let decision = decide(&path, query.as_deref(), session.as_ref(), host.as_deref());

    match decision {
        GateDecision::Pass => {
            tracing::debug!(%path, "gate: pass");
            if let Some(claims) = session {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
        GateDecision::Redirect(location) => {
            tracing::debug!(%path, %location, "gate: redirect");
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Unauthorized => {
            tracing::info!(%path, "gate: unauthenticated api request");
            AppError::InvalidSession.into_response()
        }
        GateDecision::Forbidden => {
            tracing::info!(%path, "gate: forbidden api request");
            AppError::Forbidden.into_response()
        }
        GateDecision::AccessDenied => {
            tracing::info!(%path, "gate: access denied");
            (StatusCode::FORBIDDEN, pages::access_denied_html()).into_response()
        }
    }
}
