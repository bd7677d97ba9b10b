//! Round-table gallery endpoints
//!
//! - GET /api/round-table - Photos of published events
//! - /api/admin/round-table[/{id}] - Admin CRUD over every photo

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{
    CreateGalleryItemInput, EventGalleryItem, GalleryEntry, UpdateGalleryItemInput,
};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all).post(create_item))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
}

async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<GalleryEntry>>, ApiError> {
    Ok(Json(state.gallery_service.list_public().await?))
}

async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<GalleryEntry>>, ApiError> {
    Ok(Json(state.gallery_service.list_all().await?))
}

async fn create_item(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateGalleryItemInput>,
) -> Result<(StatusCode, Json<EventGalleryItem>), ApiError> {
    let item = state.gallery_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<GalleryEntry>, ApiError> {
    Ok(Json(state.gallery_service.get(id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateGalleryItemInput>,
) -> Result<Json<EventGalleryItem>, ApiError> {
    Ok(Json(state.gallery_service.update(id, input).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.gallery_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
