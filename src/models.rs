use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    permissions::Role,
};

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_INACTIVE: &str = "INACTIVE";
pub const WALK_IN_PREFIX: &str = "Walk-in";

// --- Core Application Schemas (Mapped to Database) ---

/// UserRecord
///
/// A `users` row including the password hash. Internal to the login flow; never
/// serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
}

/// User
///
/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            full_name: record.full_name,
            role: record.role,
            status: record.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: String,
}

/// Product
///
/// A sellable item. Money is stored in integer minor units. Deleting a product
/// only flags it; sales keep pointing at it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub category_id: i32,
    pub supplier_id: Option<i32>,
    #[ts(type = "number")]
    pub price: i64,
    #[ts(type = "number")]
    pub cost_price: i64,
    pub stock_quantity: i32,
    #[ts(type = "string | null")]
    pub expiry_date: Option<NaiveDate>,
    pub status: String,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: String,
}

/// CustomerSummary
///
/// Customer list entry augmented with the sum of the customer's sale totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub customer: Customer,
    #[ts(type = "number")]
    pub total_purchases: i64,
}

/// SupplierDetail
///
/// A supplier together with the live products it provides.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: i32,
    pub sale_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[ts(type = "number")]
    pub unit_price: i64,
    #[ts(type = "number")]
    pub discount: i64,
    #[ts(type = "number")]
    pub subtotal: i64,
}

/// Sale
///
/// A finalized sale. `items` is loaded separately from `sale_items`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: i32,
    pub user_id: i32,
    pub customer_id: i32,
    pub payment_method: String,
    #[ts(type = "number")]
    pub tax_amount: i64,
    #[ts(type = "number")]
    pub total_amount: i64,
    #[ts(type = "number")]
    pub discount_amount: i64,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Driver {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub is_deleted: bool,
}

/// DeliveryStatus
///
/// The whitelisted states a delivery can be moved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Dispatched,
    Delivered,
    Canceled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Dispatched => "dispatched",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Delivery {
    pub id: i32,
    pub sale_id: i32,
    pub customer_id: i32,
    pub driver_id: Option<i32>,
    pub delivery_address: String,
    #[ts(type = "string | null")]
    pub delivery_date: Option<DateTime<Utc>>,
    pub status: String,
}

/// CustomerHistory
///
/// A customer with every sale made to them, newest first. Each sale carries its
/// items and, when one was booked, its delivery.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerHistory {
    #[serde(flatten)]
    pub customer: Customer,
    pub sales: Vec<SaleHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleHistoryEntry {
    #[serde(flatten)]
    pub sale: Sale,
    pub delivery: Option<Delivery>,
}

// --- Envelopes ---

/// ApiResponse
///
/// Success envelope used by every resource endpoint: `{ success: true, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Both fields default to empty so a missing field is a validation error rather
/// than a body-rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// SessionUser
///
/// The identity echoed back on login and by `/api/me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

/// NewUser
///
/// A validated user with its password already hashed, ready to persist.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}

/// UpdateUserRequest
///
/// Partial update of a staff account. A new password is re-hashed before it is
/// stored; a role change applies from the user's next login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// UserChanges
///
/// A validated `UpdateUserRequest`, password already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateSupplierRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProductRequest {
    pub name: String,
    pub barcode: Option<String>,
    pub category_id: i32,
    pub supplier_id: Option<i32>,
    #[ts(type = "number")]
    pub price: i64,
    #[ts(type = "number")]
    pub cost_price: i64,
    pub stock_quantity: i32,
    #[ts(type = "string | null")]
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// UpdateProductRequest
///
/// Partial update: only provided fields change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub cost_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.barcode.is_none()
            && self.category_id.is_none()
            && self.supplier_id.is_none()
            && self.price.is_none()
            && self.cost_price.is_none()
            && self.stock_quantity.is_none()
            && self.expiry_date.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCustomerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// SaleLineRequest
///
/// One cart line submitted for finalization. `subtotal` defaults to
/// `unitPrice * quantity` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineRequest {
    pub product_id: i32,
    pub quantity: i32,
    #[ts(type = "number")]
    pub unit_price: i64,
    #[serde(default)]
    #[ts(type = "number")]
    pub discount: i64,
    #[ts(type = "number | null")]
    pub subtotal: Option<i64>,
}

impl SaleLineRequest {
    /// Validation error if `unitPrice * quantity` does not fit in an `i64`.
    pub fn subtotal(&self) -> AppResult<i64> {
        match self.subtotal {
            Some(subtotal) => Ok(subtotal),
            None => self
                .unit_price
                .checked_mul(i64::from(self.quantity))
                .ok_or_else(|| amount_overflow(self.product_id)),
        }
    }
}

/// FinalizeSaleRequest
///
/// Input for `POST /api/sale`. Without a (known) `customerId` the sale is attached
/// to a freshly created walk-in customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinalizeSaleRequest {
    pub customer_id: Option<i32>,
    pub payment_method: String,
    #[serde(default)]
    #[ts(type = "number")]
    pub tax_amount: i64,
    #[ts(type = "number")]
    pub total_amount: i64,
    pub items: Vec<SaleLineRequest>,
}

impl FinalizeSaleRequest {
    /// Total discount across lines: per-unit discount times quantity.
    pub fn discount_amount(&self) -> AppResult<i64> {
        self.items.iter().try_fold(0i64, |total, line| {
            line.discount
                .checked_mul(i64::from(line.quantity))
                .and_then(|amount| total.checked_add(amount))
                .ok_or_else(|| amount_overflow(line.product_id))
        })
    }
}

fn amount_overflow(product_id: i32) -> AppError {
    AppError::Validation(format!("Amounts for product {product_id} are out of range"))
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDriverRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateDeliveryRequest {
    pub sale_id: i32,
    pub customer_id: i32,
    pub delivery_address: String,
    pub driver_id: Option<i32>,
    #[ts(type = "string | null")]
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateDeliveryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
}

// --- Validation ---

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{10}|\+?[0-9 ]{10,15})$").expect("phone pattern must compile")
});

fn check_len(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: i64) -> AppResult<()> {
    if value < 0 {
        return Err(AppError::Validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

fn check_status(status: &str) -> AppResult<()> {
    if status == STATUS_ACTIVE || status == STATUS_INACTIVE {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "Status must be one of: {STATUS_ACTIVE}, {STATUS_INACTIVE}"
    )))
}

fn empty_body() -> AppError {
    AppError::Validation("Request body cannot be empty".into())
}

fn parse_role(role: &str) -> AppResult<Role> {
    role.parse::<Role>().map_err(|_| {
        let allowed: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
        AppError::Validation(format!("Role is required. Allowed: {}", allowed.join(", ")))
    })
}

fn check_driver_phone(phone: &str) -> AppResult<()> {
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Phone number must contain only digits".into(),
        ));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::Validation("Please enter a valid email".into())),
    }
}

fn check_phone(phone: &str) -> AppResult<()> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Phone number must be 10 digits or a valid international format".into(),
        ))
    }
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("Missing credentials".into()));
        }
        Ok(())
    }
}

impl CreateUserRequest {
    /// Validates the payload and returns the parsed role.
    pub fn validate(&self) -> AppResult<Role> {
        check_len("username", &self.username, 2, 100)?;
        check_len("password", &self.password, 6, 100)?;
        check_len("fullName", &self.full_name, 2, 100)?;
        parse_role(&self.role)
    }
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.full_name.is_none()
            && self.role.is_none()
            && self.status.is_none()
    }

    /// Validates the provided fields and returns the parsed role, if one was given.
    pub fn validate(&self) -> AppResult<Option<Role>> {
        if self.is_empty() {
            return Err(empty_body());
        }
        if let Some(username) = &self.username {
            check_len("username", username, 2, 100)?;
        }
        if let Some(password) = &self.password {
            check_len("password", password, 6, 100)?;
        }
        if let Some(full_name) = &self.full_name {
            check_len("fullName", full_name, 2, 100)?;
        }
        if let Some(status) = &self.status {
            check_status(status)?;
        }
        self.role.as_deref().map(parse_role).transpose()
    }
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_len("name", &self.name, 1, 100)
    }
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_none() && self.status.is_none() {
            return Err(empty_body());
        }
        if let Some(name) = &self.name {
            check_len("name", name, 1, 100)?;
        }
        if let Some(status) = &self.status {
            check_status(status)?;
        }
        Ok(())
    }
}

impl CreateSupplierRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_len("name", &self.name, 1, 255)?;
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

impl UpdateSupplierRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact_person.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.status.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(empty_body());
        }
        if let Some(name) = &self.name {
            check_len("name", name, 1, 255)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(status) = &self.status {
            check_status(status)?;
        }
        Ok(())
    }
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_len("name", &self.name, 1, 255)?;
        if let Some(barcode) = &self.barcode {
            check_len("barcode", barcode, 1, 255)?;
        }
        if self.category_id <= 0 {
            return Err(AppError::Validation(
                "Category ID must be a positive number".into(),
            ));
        }
        if matches!(self.supplier_id, Some(id) if id <= 0) {
            return Err(AppError::Validation(
                "Supplier ID must be a positive number".into(),
            ));
        }
        check_non_negative("price", self.price)?;
        check_non_negative("costPrice", self.cost_price)?;
        check_non_negative("stockQuantity", i64::from(self.stock_quantity))
    }
}

impl UpdateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(empty_body());
        }
        if let Some(name) = &self.name {
            check_len("name", name, 1, 255)?;
        }
        if let Some(barcode) = &self.barcode {
            check_len("barcode", barcode, 1, 255)?;
        }
        if let Some(price) = self.price {
            check_non_negative("price", price)?;
        }
        if let Some(cost_price) = self.cost_price {
            check_non_negative("costPrice", cost_price)?;
        }
        if let Some(stock) = self.stock_quantity {
            check_non_negative("stockQuantity", i64::from(stock))?;
        }
        Ok(())
    }
}

impl CreateCustomerRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Customer name is required".into()));
        }
        check_len("name", &self.name, 2, 100)?;
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }
        if let Some(address) = &self.address {
            check_len("address", address, 10, 255)?;
        }
        Ok(())
    }

    /// Whether the caller asked for an auto-numbered walk-in customer.
    pub fn is_walk_in(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case("walk-in")
    }
}

impl UpdateCustomerRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            check_len("name", name, 2, 100)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }
        if let Some(address) = &self.address {
            check_len("address", address, 10, 255)?;
        }
        Ok(())
    }
}

impl FinalizeSaleRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.payment_method.trim().is_empty() {
            return Err(AppError::Validation("Payment method is required".into()));
        }
        check_non_negative("taxAmount", self.tax_amount)?;
        check_non_negative("totalAmount", self.total_amount)?;
        if self.items.is_empty() {
            return Err(AppError::Validation("At least one item is required".into()));
        }
        for line in &self.items {
            if line.quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "Quantity for product {} must be positive",
                    line.product_id
                )));
            }
            check_non_negative("unitPrice", line.unit_price)?;
            check_non_negative("discount", line.discount)?;
            if let Some(subtotal) = line.subtotal {
                check_non_negative("subtotal", subtotal)?;
            }
            line.subtotal()?;
        }
        self.discount_amount()?;
        Ok(())
    }
}

impl CreateDriverRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(AppError::Validation("Name and phone are required".into()));
        }
        check_driver_phone(&self.phone)
    }
}

impl UpdateDriverRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_none() && self.phone.is_none() {
            return Err(empty_body());
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        if let Some(phone) = &self.phone {
            check_driver_phone(phone)?;
        }
        Ok(())
    }
}

impl CreateDeliveryRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.sale_id <= 0 || self.customer_id <= 0 || self.delivery_address.trim().is_empty() {
            return Err(AppError::Validation(
                "saleId, customerId, and deliveryAddress are required".into(),
            ));
        }
        Ok(())
    }
}
