//! Blog post endpoints
//!
//! Public:
//! - GET /api/posts - Published posts, paginated, `author` and `tag` filters
//! - GET /api/posts/{slug} - Published post by slug
//!
//! Admin:
//! - GET /api/admin/posts - All posts with `status`, `author`, `tag` filters
//! - POST /api/admin/posts - Create a post
//! - GET /api/admin/posts/{id} - Get a post
//! - PUT /api/admin/posts/{id} - Update a post
//! - DELETE /api/admin/posts/{id} - Delete a post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{AdminPostQuery, PublicPostQuery};
use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{CreatePostInput, PagedResult, Post, PostFilter, UpdatePostInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
}

async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<PublicPostQuery>,
) -> Result<Json<PagedResult<Post>>, ApiError> {
    let page = state
        .post_service
        .list_published(query.author, query.tag.clone(), &query.params())
        .await?;
    Ok(Json(page))
}

async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.post_service.get_published(&slug).await?))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<AdminPostQuery>,
) -> Result<Json<PagedResult<Post>>, ApiError> {
    let filter = PostFilter {
        status: query.status,
        author_id: query.author,
        tag: query.tag.clone(),
    };
    Ok(Json(state.post_service.list(&filter, &query.params()).await?))
}

async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.post_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.post_service.get(id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdatePostInput>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.post_service.update(id, input).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
