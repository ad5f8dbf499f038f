use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        ApiResponse, CreateCustomerRequest, Customer, CustomerHistory, CustomerSummary,
        UpdateCustomerRequest,
    },
};

fn not_found() -> AppError {
    AppError::NotFound("Customer not found".into())
}

/// list_customers
///
/// Active customers, each with the running total of their purchases.
#[utoipa::path(
    get,
    path = "/api/customer",
    responses((status = 200, description = "Customers", body = [CustomerSummary]))
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CustomerSummary>>>> {
    let customers = state.repo.list_customers().await?;
    Ok(Json(ApiResponse::ok(customers)))
}

#[utoipa::path(
    get,
    path = "/api/customer/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let customer = state.repo.get_customer(id).await?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(customer)))
}

/// create_customer
///
/// A name of `walk-in` (any case) skips the contact fields and creates the next
/// numbered walk-in customer instead.
#[utoipa::path(
    post,
    path = "/api/customer",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Created", body = Customer),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Duplicate email or phone")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Customer>>)> {
    if !payload.is_walk_in() {
        payload.validate()?;
    }
    let customer = state.repo.create_customer(payload).await?;
    tracing::info!(customer_id = customer.id, name = %customer.name, "customer created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(customer))))
}

#[utoipa::path(
    put,
    path = "/api/customer/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Updated", body = Customer),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate email or phone")
    )
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    payload.validate()?;
    let customer = state
        .repo
        .update_customer(id, payload)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(customer)))
}

/// customer_history
///
/// Every sale made to the customer, newest first, with line items and any
/// booked delivery.
#[utoipa::path(
    get,
    path = "/api/customer/{id}/history",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Purchase history", body = CustomerHistory),
        (status = 404, description = "Not Found")
    )
)]
pub async fn customer_history(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<CustomerHistory>>> {
    let history = state.repo.customer_history(id).await?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(history)))
}
