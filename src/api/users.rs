//! User management endpoints (admin only)
//!
//! - GET /api/admin/users - List accounts
//! - GET /api/admin/users/{id} - Get an account
//! - PUT /api/admin/users/{id} - Change name, role or status
//! - DELETE /api/admin/users/{id} - Delete an account
//!
//! Accounts are created through invitations, not here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::{UpdateUserInput, User};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list().await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get(id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.update(actor.id, id, input).await?;
    tracing::info!("User {} updated account {}", actor.id, id);
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(actor.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
