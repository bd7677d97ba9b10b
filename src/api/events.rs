//! Event endpoints
//!
//! Public:
//! - GET /api/events - Published events, `upcoming`, `featured` and
//!   `organization_unit_id` filters
//! - GET /api/events/{slug} - Published event with unit, agenda and photos
//!
//! Admin:
//! - /api/admin/events[/{id}] - CRUD
//! - /api/admin/events/{id}/sessions[/{session_id}] - Agenda CRUD

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{
    CreateEventInput, CreateEventSessionInput, Event, EventDetail, EventFilter, EventSession,
    UpdateEventInput, UpdateEventSessionInput,
};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public))
        .route("/{slug}", get(get_public))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{id}", get(get_event).put(update_event).delete(delete_event))
        .route("/{id}/sessions", get(list_sessions).post(create_session))
        .route(
            "/{id}/sessions/{session_id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}

async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.event_service.list_public(&filter).await?))
}

async fn get_public(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<EventDetail>, ApiError> {
    Ok(Json(state.event_service.get_published_detail(&slug).await?))
}

async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.event_service.list(&filter).await?))
}

async fn create_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.event_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventDetail>, ApiError> {
    Ok(Json(state.event_service.get_detail(id).await?))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateEventInput>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.event_service.update(id, input).await?))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.event_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sessions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EventSession>>, ApiError> {
    Ok(Json(state.event_service.list_sessions(id).await?))
}

async fn create_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<CreateEventSessionInput>,
) -> Result<(StatusCode, Json<EventSession>), ApiError> {
    let session = state.event_service.create_session(id, input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path((id, session_id)): Path<(i64, i64)>,
) -> Result<Json<EventSession>, ApiError> {
    Ok(Json(state.event_service.get_session(id, session_id).await?))
}

async fn update_session(
    State(state): State<AppState>,
    Path((id, session_id)): Path<(i64, i64)>,
    ApiJson(input): ApiJson<UpdateEventSessionInput>,
) -> Result<Json<EventSession>, ApiError> {
    let session = state
        .event_service
        .update_session(id, session_id, input)
        .await?;
    Ok(Json(session))
}

async fn delete_session(
    State(state): State<AppState>,
    Path((id, session_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.event_service.delete_session(id, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
