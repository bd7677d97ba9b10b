//! Author endpoints (admin only)
//!
//! - GET /api/admin/authors - List authors
//! - POST /api/admin/authors - Create an author
//! - GET /api/admin/authors/{id} - Get an author
//! - PUT /api/admin/authors/{id} - Update an author
//! - DELETE /api/admin/authors/{id} - Delete an author, detaching their posts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{Author, CreateAuthorInput, UpdateAuthorInput};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/{id}", get(get_author).put(update_author).delete(delete_author))
}

async fn list_authors(State(state): State<AppState>) -> Result<Json<Vec<Author>>, ApiError> {
    Ok(Json(state.author_service.list().await?))
}

async fn create_author(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateAuthorInput>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let author = state.author_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, ApiError> {
    Ok(Json(state.author_service.get(id).await?))
}

async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateAuthorInput>,
) -> Result<Json<Author>, ApiError> {
    Ok(Json(state.author_service.update(id, input).await?))
}

async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.author_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
