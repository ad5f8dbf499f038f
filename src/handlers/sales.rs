use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{ApiResponse, FinalizeSaleRequest, Sale},
    permissions::perm,
};

/// finalize_sale
///
/// [sales.create] Records a sale for the signed-in user.
///
/// The sale, its items, the stock decrements and (when no known customer is
/// given) a new walk-in customer are written all together or not at all. Asking
/// for more than is in stock fails with a message naming the product and the
/// available and requested quantities.
#[utoipa::path(
    post,
    path = "/api/sale",
    request_body = FinalizeSaleRequest,
    responses(
        (status = 201, description = "Sale finalized", body = Sale),
        (status = 400, description = "Invalid payload or insufficient stock"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn finalize_sale(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<FinalizeSaleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Sale>>)> {
    payload.validate()?;

    let sale = state.repo.finalize_sale(user.id, payload).await.inspect_err(|e| {
        if let AppError::InsufficientStock { .. } = e {
            tracing::info!(user_id = user.id, "sale rejected: {e}");
        }
    })?;

    tracing::info!(
        sale_id = sale.id,
        user_id = user.id,
        customer_id = sale.customer_id,
        items = sale.items.len(),
        total = sale.total_amount,
        "sale finalized"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(sale))))
}

/// list_sales
///
/// [sales.view] Sales newest first, with their items.
#[utoipa::path(
    get,
    path = "/api/sale",
    responses(
        (status = 200, description = "Sales", body = [Sale]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn list_sales(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Sale>>>> {
    user.require(perm::SALES_VIEW)?;
    let sales = state.repo.list_sales().await?;
    Ok(Json(ApiResponse::ok(sales)))
}

#[utoipa::path(
    get,
    path = "/api/sale/{id}",
    params(("id" = i32, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale", body = Sale),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_sale(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Sale>>> {
    user.require(perm::SALES_VIEW)?;
    let sale = state
        .repo
        .get_sale(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale not found".into()))?;
    Ok(Json(ApiResponse::ok(sale)))
}
