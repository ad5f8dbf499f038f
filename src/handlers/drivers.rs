use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{ApiResponse, CreateDriverRequest, Driver, UpdateDriverRequest},
};

fn not_found() -> AppError {
    AppError::NotFound("Driver not found".into())
}

#[utoipa::path(
    get,
    path = "/api/drivers",
    responses((status = 200, description = "Drivers", body = [Driver]))
)]
pub async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Driver>>>> {
    let drivers = state.repo.list_drivers().await?;
    Ok(Json(ApiResponse::ok(drivers)))
}

/// create_driver
///
/// Phone must be digits only and unique; a duplicate is reported as a 400.
#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Created", body = Driver),
        (status = 400, description = "Invalid payload or duplicate phone")
    )
)]
pub async fn create_driver(
    State(state): State<AppState>,
    Json(payload): Json<CreateDriverRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Driver>>)> {
    payload.validate()?;
    let driver = state.repo.create_driver(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(driver))))
}

#[utoipa::path(
    patch,
    path = "/api/drivers/{id}",
    params(("id" = i32, Path, description = "Driver id")),
    request_body = UpdateDriverRequest,
    responses(
        (status = 200, description = "Updated", body = Driver),
        (status = 400, description = "Invalid payload or duplicate phone"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDriverRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    payload.validate()?;
    let driver = state.repo.update_driver(id, payload).await?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(driver)))
}

/// delete_driver
///
/// Soft delete: the driver drops out of listings and can no longer be assigned,
/// while existing deliveries keep their reference.
#[utoipa::path(
    delete,
    path = "/api/drivers/{id}",
    params(("id" = i32, Path, description = "Driver id")),
    responses(
        (status = 200, description = "Deleted", body = Driver),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let driver = state.repo.delete_driver(id).await?.ok_or_else(not_found)?;
    tracing::info!(driver_id = id, "driver deleted");
    Ok(Json(ApiResponse::ok(driver)))
}
