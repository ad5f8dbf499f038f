use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, patch},
};

/// Protected Router Module
///
/// Everything here is reached only after the gate has verified the session and
/// checked the permission `gate::ROUTE_RULES` assigns to the path.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Dashboard landing page for any signed-in user.
        .route("/", get(pages::home))
        // GET /api/me
        .route("/api/me", get(handlers::auth::get_me))
        // Users (users.manage)
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Products (products.manage)
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        // Categories (categories.manage) and suppliers (suppliers.manage)
        .route(
            "/api/category",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/api/category/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/api/suppliers",
            get(handlers::catalog::list_suppliers).post(handlers::catalog::create_supplier),
        )
        .route(
            "/api/suppliers/{id}",
            get(handlers::catalog::get_supplier)
                .put(handlers::catalog::update_supplier)
                .delete(handlers::catalog::delete_supplier),
        )
        // Customers (customers.manage)
        .route(
            "/api/customer",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/api/customer/{id}",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        )
        .route("/api/customer/{id}/history", get(handlers::customers::customer_history))
        // Sales (sales.create; reads additionally need sales.view)
        .route(
            "/api/sale",
            get(handlers::sales::list_sales).post(handlers::sales::finalize_sale),
        )
        .route("/api/sale/{id}", get(handlers::sales::get_sale))
        // Drivers (drivers.manage) and deliveries (deliveries.manage)
        .route(
            "/api/drivers",
            get(handlers::drivers::list_drivers).post(handlers::drivers::create_driver),
        )
        .route(
            "/api/drivers/{id}",
            patch(handlers::drivers::update_driver).delete(handlers::drivers::delete_driver),
        )
        .route(
            "/api/deliveries",
            get(handlers::deliveries::list_deliveries).post(handlers::deliveries::create_delivery),
        )
        .route("/api/deliveries/{id}", patch(handlers::deliveries::update_delivery))
}
