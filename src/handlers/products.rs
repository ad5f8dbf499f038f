use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{ApiResponse, CreateProductRequest, Product, UpdateProductRequest},
};

fn not_found() -> AppError {
    AppError::NotFound("Product not found".into())
}

/// list_products
///
/// Lists every product that has not been soft-deleted.
#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "Products", body = [Product]))
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = state.repo.list_products().await?;
    Ok(Json(ApiResponse::ok(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state
        .repo
        .get_product(id)
        .await?
        .filter(|product| !product.is_deleted)
        .ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(product)))
}

/// create_product
///
/// The referenced category (and supplier, if given) must already exist. Name and
/// barcode are unique across all products.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Invalid payload or missing category/supplier"),
        (status = 409, description = "Duplicate name or barcode")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    payload.validate()?;
    let product = state.repo.create_product(payload).await?;
    tracing::info!(product_id = product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate name or barcode")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    payload.validate()?;
    let product = state
        .repo
        .update_product(id, payload)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(product)))
}

/// delete_product
///
/// Soft delete: the row stays so past sales keep resolving, but the product
/// disappears from listings and can no longer be sold.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.repo.delete_product(id).await?.ok_or_else(not_found)?;
    tracing::info!(product_id = id, "product deleted");
    Ok(Json(ApiResponse::ok(product)))
}
