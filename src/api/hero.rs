//! Hero announcement endpoints
//!
//! - GET /api/hero - Banners visible right now
//! - /api/admin/hero-announcements[/{id}] - Admin CRUD

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{CreateHeroInput, HeroAnnouncement, UpdateHeroInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_visible))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_heroes).post(create_hero))
        .route("/{id}", get(get_hero).put(update_hero).delete(delete_hero))
}

async fn list_visible(
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroAnnouncement>>, ApiError> {
    Ok(Json(state.hero_service.list_visible().await?))
}

async fn list_heroes(
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroAnnouncement>>, ApiError> {
    Ok(Json(state.hero_service.list().await?))
}

async fn create_hero(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateHeroInput>,
) -> Result<(StatusCode, Json<HeroAnnouncement>), ApiError> {
    let hero = state.hero_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(hero)))
}

async fn get_hero(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<HeroAnnouncement>, ApiError> {
    Ok(Json(state.hero_service.get(id).await?))
}

async fn update_hero(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateHeroInput>,
) -> Result<Json<HeroAnnouncement>, ApiError> {
    Ok(Json(state.hero_service.update(id, input).await?))
}

async fn delete_hero(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.hero_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
