use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Modules ---

// Configuration, errors, persistence and request handling.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod repository;

// Access control: signed sessions, the route table and the role/permission model.
pub mod gate;
pub mod permissions;
pub mod session;

// Routing split by audience (public, protected).
pub mod routes;
use routes::{api, public};

// --- Crate Exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use session::SessionCodec;

/// ApiDoc
///
/// Auto-generated OpenAPI document for every handler decorated with
/// `#[utoipa::path]`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::logout, handlers::auth::get_me,
        handlers::users::list_users, handlers::users::create_user, handlers::users::get_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::products::list_products, handlers::products::get_product,
        handlers::products::create_product, handlers::products::update_product,
        handlers::products::delete_product,
        handlers::catalog::list_categories, handlers::catalog::get_category,
        handlers::catalog::create_category, handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_suppliers, handlers::catalog::get_supplier,
        handlers::catalog::create_supplier, handlers::catalog::update_supplier,
        handlers::catalog::delete_supplier,
        handlers::customers::list_customers, handlers::customers::get_customer,
        handlers::customers::create_customer, handlers::customers::update_customer,
        handlers::customers::customer_history,
        handlers::sales::finalize_sale, handlers::sales::list_sales, handlers::sales::get_sale,
        handlers::drivers::list_drivers, handlers::drivers::create_driver,
        handlers::drivers::update_driver, handlers::drivers::delete_driver,
        handlers::deliveries::list_deliveries, handlers::deliveries::create_delivery,
        handlers::deliveries::update_delivery,
    ),
    components(
        schemas(
            models::User, models::Category, models::Supplier, models::Product,
            models::SupplierDetail, models::Customer, models::CustomerSummary,
            models::CustomerHistory, models::SaleHistoryEntry, models::Sale, models::SaleItem,
            models::Driver, models::Delivery, models::DeliveryStatus,
            models::LoginRequest, models::LoginResponse, models::SessionUser,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateSupplierRequest, models::UpdateSupplierRequest,
            models::CreateProductRequest, models::UpdateProductRequest,
            models::CreateCustomerRequest, models::UpdateCustomerRequest,
            models::SaleLineRequest, models::FinalizeSaleRequest,
            models::CreateDriverRequest, models::UpdateDriverRequest,
            models::CreateDeliveryRequest, models::UpdateDeliveryRequest,
        )
    ),
    tags(
        (name = "pos-portal", description = "Point-of-sale back office API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the application's services and configuration.
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in deployments, in-memory locally and in tests.
    pub repo: RepositoryState,
    /// Issues and verifies session tokens.
    pub sessions: SessionCodec,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state, deriving the session codec from the configuration.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let sessions = SessionCodec::new(
            &config.session_secret,
            chrono::Duration::hours(config.session_ttl_hours),
        );
        Self {
            repo,
            sessions,
            config,
        }
    }
}

// --- State Extraction ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionCodec {
    fn from_ref(app_state: &AppState) -> SessionCodec {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, wraps it in the access gate, and applies the
/// observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS (the frontend is served from another origin)
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Correlation header shared by the request-id layers.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Routes
    let base_router = Router::new()
        // API docs, public to match the route table.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(api::api_routes())
        // The gate sees every request, routed or not, so unknown paths still
        // need a session (and get a login redirect or a 401) before they 404.
        .layer(middleware::from_fn_with_state(state.clone(), gate::access_gate))
        .with_state(state);

    // 3. Request-id and tracing layers (outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request tracing span, correlating every log line of a request
/// through its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
