use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{ApiResponse, CreateDeliveryRequest, Delivery, UpdateDeliveryRequest},
};

#[utoipa::path(
    get,
    path = "/api/deliveries",
    responses((status = 200, description = "Deliveries", body = [Delivery]))
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Delivery>>>> {
    let deliveries = state.repo.list_deliveries().await?;
    Ok(Json(ApiResponse::ok(deliveries)))
}

/// create_delivery
///
/// Schedules delivery of a finalized sale. Each sale has at most one delivery;
/// new deliveries start as `pending`.
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = CreateDeliveryRequest,
    responses(
        (status = 201, description = "Created", body = Delivery),
        (status = 400, description = "Invalid payload or delivery already exists"),
        (status = 404, description = "Sale not found")
    )
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Delivery>>)> {
    payload.validate()?;
    let delivery = state.repo.create_delivery(payload).await?;
    tracing::info!(delivery_id = delivery.id, sale_id = delivery.sale_id, "delivery created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(delivery))))
}

/// update_delivery
///
/// Moves a delivery to another whitelisted status and/or (re)assigns its driver.
/// Unknown status strings are rejected when the body is parsed.
#[utoipa::path(
    patch,
    path = "/api/deliveries/{id}",
    params(("id" = i32, Path, description = "Delivery id")),
    request_body = UpdateDeliveryRequest,
    responses(
        (status = 200, description = "Updated", body = Delivery),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDeliveryRequest>,
) -> AppResult<Json<ApiResponse<Delivery>>> {
    let delivery = state
        .repo
        .update_delivery(id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery not found".into()))?;
    Ok(Json(ApiResponse::ok(delivery)))
}
