//! Admin dashboard endpoints
//!
//! - GET /api/admin/stats - Content and account counters

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::PostStatus;

/// Post counts per status
#[derive(Debug, Serialize)]
pub struct PostStats {
    pub draft: i64,
    pub published: i64,
    pub archived: i64,
}

/// Dashboard counters
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub posts: PostStats,
    pub events: i64,
    pub users: i64,
    pub pending_invitations: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let posts = &state.post_service;
    let stats = DashboardStats {
        posts: PostStats {
            draft: posts.count_by_status(PostStatus::Draft).await?,
            published: posts.count_by_status(PostStatus::Published).await?,
            archived: posts.count_by_status(PostStatus::Archived).await?,
        },
        events: state.event_service.count().await?,
        users: state.user_service.count().await?,
        pending_invitations: state.invitation_service.count_pending().await?,
    };
    Ok(Json(stats))
}
