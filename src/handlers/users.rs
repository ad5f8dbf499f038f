use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::auth::hash_password;
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{ApiResponse, CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges},
};

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Active users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let users = state.repo.list_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// create_user
///
/// [users.manage] Creates a staff account. The password is stored as a bcrypt
/// hash and the role must be one of the known roles.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Invalid payload or unknown role"),
        (status = 409, description = "Username already in use")
    )
)]
pub async fn create_user(
    actor: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let role = payload.validate()?;
    let password_hash = hash_password(&payload.password)?;

    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username.trim().to_string(),
            full_name: payload.full_name.trim().to_string(),
            password_hash,
            role,
        })
        .await?;

    tracing::info!(user_id = user.id, role = %role, created_by = actor.id, "user created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.repo.get_user(id).await?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(user)))
}

/// update_user
///
/// [users.manage] Partial update. A new password is re-hashed; a role or status
/// change takes effect at the user's next login, since live sessions carry the
/// role they were issued with.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Empty or invalid payload"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Username already in use")
    )
)]
pub async fn update_user(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let role = payload.validate()?;
    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;

    let changes = UserChanges {
        username: payload.username.map(|username| username.trim().to_string()),
        full_name: payload.full_name.map(|full_name| full_name.trim().to_string()),
        password_hash,
        role,
        status: payload.status,
    };
    let user = state.repo.update_user(id, changes).await?.ok_or_else(not_found)?;

    tracing::info!(user_id = user.id, updated_by = actor.id, "user updated");
    Ok(Json(ApiResponse::ok(user)))
}

/// delete_user
///
/// [users.manage] Deactivates the account. The row is kept so past sales stay
/// attributed; the user can no longer sign in.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Deactivated", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.repo.deactivate_user(id).await?.ok_or_else(not_found)?;
    tracing::info!(user_id = id, deactivated_by = actor.id, "user deactivated");
    Ok(Json(ApiResponse::ok(user)))
}
