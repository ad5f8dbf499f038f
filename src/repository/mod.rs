use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        Category, CreateCategoryRequest, CreateCustomerRequest, CreateDeliveryRequest,
        CreateDriverRequest, CreateProductRequest, CreateSupplierRequest, Customer,
        CustomerHistory, CustomerSummary, Delivery, Driver, FinalizeSaleRequest, NewUser, Product,
        Sale, Supplier, SupplierDetail, UpdateCategoryRequest, UpdateCustomerRequest,
        UpdateDeliveryRequest, UpdateDriverRequest, UpdateProductRequest, UpdateSupplierRequest,
        User, UserChanges, UserRecord,
    },
    permissions::Role,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The abstract contract for every persistence operation. Handlers only see this
/// trait, so the Postgres store and the in-memory store are interchangeable.
///
/// Business rules that protect data integrity (uniqueness, referenced rows
/// existing, stock availability) are enforced here, inside the store, so they hold
/// for every caller.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;
    // Active users only.
    async fn list_users(&self) -> AppResult<Vec<User>>;
    // Conflict if the username is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: i32) -> AppResult<Option<User>>;
    // Conflict if the new username is taken.
    async fn update_user(&self, id: i32, changes: UserChanges) -> AppResult<Option<User>>;
    // Sets the status to INACTIVE, which blocks future logins.
    async fn deactivate_user(&self, id: i32) -> AppResult<Option<User>>;

    // --- Catalog ---
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn get_category(&self, id: i32) -> AppResult<Option<Category>>;
    async fn create_category(&self, req: CreateCategoryRequest) -> AppResult<Category>;
    async fn update_category(&self, id: i32, req: UpdateCategoryRequest) -> AppResult<Option<Category>>;
    async fn deactivate_category(&self, id: i32) -> AppResult<Option<Category>>;
    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>>;
    // Includes the supplier's products that are not soft-deleted.
    async fn get_supplier(&self, id: i32) -> AppResult<Option<SupplierDetail>>;
    async fn create_supplier(&self, req: CreateSupplierRequest) -> AppResult<Supplier>;
    async fn update_supplier(&self, id: i32, req: UpdateSupplierRequest) -> AppResult<Option<Supplier>>;
    async fn deactivate_supplier(&self, id: i32) -> AppResult<Option<Supplier>>;

    // --- Products ---
    // Excludes soft-deleted products.
    async fn list_products(&self) -> AppResult<Vec<Product>>;
    async fn get_product(&self, id: i32) -> AppResult<Option<Product>>;
    // Validation if the category/supplier is missing; Conflict on duplicate name or barcode.
    async fn create_product(&self, req: CreateProductRequest) -> AppResult<Product>;
    async fn update_product(&self, id: i32, req: UpdateProductRequest) -> AppResult<Option<Product>>;
    // Soft delete. Returns the flagged product.
    async fn delete_product(&self, id: i32) -> AppResult<Option<Product>>;

    // --- Customers ---
    // Active customers with their purchase totals.
    async fn list_customers(&self) -> AppResult<Vec<CustomerSummary>>;
    async fn get_customer(&self, id: i32) -> AppResult<Option<Customer>>;
    // A name of "walk-in" becomes the next `Walk-in #N`. Conflict on duplicate email/phone.
    async fn create_customer(&self, req: CreateCustomerRequest) -> AppResult<Customer>;
    async fn update_customer(&self, id: i32, req: UpdateCustomerRequest) -> AppResult<Option<Customer>>;
    // Sales newest first, each with its items and delivery.
    async fn customer_history(&self, id: i32) -> AppResult<Option<CustomerHistory>>;

    // --- Sales ---
    /// finalize_sale
    ///
    /// Atomically: resolve (or create) the customer, create the sale and its items,
    /// and decrement stock. If any line references a missing product or asks for
    /// more than is in stock, nothing is written.
    async fn finalize_sale(&self, user_id: i32, req: FinalizeSaleRequest) -> AppResult<Sale>;
    // Newest first, items included.
    async fn list_sales(&self) -> AppResult<Vec<Sale>>;
    async fn get_sale(&self, id: i32) -> AppResult<Option<Sale>>;

    // --- Drivers & Deliveries ---
    async fn list_drivers(&self) -> AppResult<Vec<Driver>>;
    // Validation on duplicate phone.
    async fn create_driver(&self, req: CreateDriverRequest) -> AppResult<Driver>;
    // None for missing or soft-deleted drivers. Validation on duplicate phone.
    async fn update_driver(&self, id: i32, req: UpdateDriverRequest) -> AppResult<Option<Driver>>;
    // Soft delete. Deliveries keep pointing at the driver.
    async fn delete_driver(&self, id: i32) -> AppResult<Option<Driver>>;
    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>>;
    // NotFound if the sale is missing; Validation if it already has a delivery.
    async fn create_delivery(&self, req: CreateDeliveryRequest) -> AppResult<Delivery>;
    async fn update_delivery(&self, id: i32, req: UpdateDeliveryRequest) -> AppResult<Option<Delivery>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// ensure_admin
///
/// Creates an `ADMIN` account with the given credentials unless the username
/// already exists. Used at startup so a fresh store is reachable.
pub async fn ensure_admin(repo: &dyn Repository, username: &str, password: &str) -> AppResult<()> {
    if repo.find_user_by_username(username).await?.is_some() {
        return Ok(());
    }

    let password_hash = crate::handlers::auth::hash_password(password)?;
    repo.create_user(NewUser {
        username: username.to_string(),
        full_name: "System Admin".to_string(),
        password_hash,
        role: Role::Admin,
    })
    .await?;

    tracing::info!(%username, "bootstrap admin account created");
    Ok(())
}

pub(crate) fn product_not_found(product_id: i32) -> AppError {
    AppError::NotFound(format!("Product with id {product_id} not found"))
}

pub(crate) fn walk_in_name(existing: i64) -> String {
    format!("{} #{}", crate::models::WALK_IN_PREFIX, existing + 1)
}
