//! Organization unit endpoints
//!
//! - GET /api/organization-units - Landing-page showcase
//! - /api/admin/organization-units[/{id}] - Admin CRUD

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{CreateOrganizationUnitInput, OrganizationUnit, UpdateOrganizationUnitInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_units))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/{id}", get(get_unit).put(update_unit).delete(delete_unit))
}

async fn list_units(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationUnit>>, ApiError> {
    Ok(Json(state.unit_service.list().await?))
}

async fn create_unit(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateOrganizationUnitInput>,
) -> Result<(StatusCode, Json<OrganizationUnit>), ApiError> {
    let unit = state.unit_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrganizationUnit>, ApiError> {
    Ok(Json(state.unit_service.get(id).await?))
}

async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateOrganizationUnitInput>,
) -> Result<Json<OrganizationUnit>, ApiError> {
    Ok(Json(state.unit_service.update(id, input).await?))
}

async fn delete_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.unit_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
