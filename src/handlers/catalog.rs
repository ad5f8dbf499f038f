use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        ApiResponse, Category, CreateCategoryRequest, CreateSupplierRequest, Supplier,
        SupplierDetail, UpdateCategoryRequest, UpdateSupplierRequest,
    },
};

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".into())
}

fn supplier_not_found() -> AppError {
    AppError::NotFound("Supplier not found".into())
}

// --- Categories ---

#[utoipa::path(
    get,
    path = "/api/category",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category = state.repo.get_category(id).await?.ok_or_else(category_not_found)?;
    Ok(Json(ApiResponse::ok(category)))
}

#[utoipa::path(
    post,
    path = "/api/category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    payload.validate()?;
    let category = state.repo.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 400, description = "Empty or invalid payload"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    payload.validate()?;
    let category = state
        .repo
        .update_category(id, payload)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(Json(ApiResponse::ok(category)))
}

/// delete_category
///
/// Marks the category `INACTIVE`. Products filed under it are left alone.
#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Deactivated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category = state
        .repo
        .deactivate_category(id)
        .await?
        .ok_or_else(category_not_found)?;
    tracing::info!(category_id = id, "category deactivated");
    Ok(Json(ApiResponse::ok(category)))
}

// --- Suppliers ---

#[utoipa::path(
    get,
    path = "/api/suppliers",
    responses((status = 200, description = "Suppliers", body = [Supplier]))
)]
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Supplier>>>> {
    let suppliers = state.repo.list_suppliers().await?;
    Ok(Json(ApiResponse::ok(suppliers)))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier with its products", body = SupplierDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<SupplierDetail>>> {
    let supplier = state.repo.get_supplier(id).await?.ok_or_else(supplier_not_found)?;
    Ok(Json(ApiResponse::ok(supplier)))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Created", body = Supplier),
        (status = 409, description = "Supplier already exists")
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    payload.validate()?;
    let supplier = state.repo.create_supplier(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(supplier))))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Updated", body = Supplier),
        (status = 400, description = "Empty or invalid payload"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Supplier already exists")
    )
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    payload.validate()?;
    let supplier = state
        .repo
        .update_supplier(id, payload)
        .await?
        .ok_or_else(supplier_not_found)?;
    Ok(Json(ApiResponse::ok(supplier)))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Deactivated", body = Supplier),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let supplier = state
        .repo
        .deactivate_supplier(id)
        .await?
        .ok_or_else(supplier_not_found)?;
    tracing::info!(supplier_id = id, "supplier deactivated");
    Ok(Json(ApiResponse::ok(supplier)))
}
