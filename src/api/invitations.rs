//! Invitation endpoints
//!
//! Public (the invite link):
//! - GET /api/invitations/{token} - Check that an invitation can be accepted
//! - POST /api/invitations/{token}/accept - Create the account
//!
//! Admin:
//! - GET /api/admin/invitations - All invitations with status
//! - POST /api/admin/invitations - Invite an email address
//! - GET /api/admin/invitations/{id} - Get an invitation
//! - DELETE /api/admin/invitations/{id} - Revoke an invitation
//! - POST /api/admin/invitations/{id}/resend - New token, new expiry, new mail

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::{AcceptInvitationInput, CreateInvitationInput, InvitationView, User};
use crate::services::IssuedInvitation;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(validate_invitation))
        .route("/{token}/accept", post(accept_invitation))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invitations).post(create_invitation))
        .route("/{id}", get(get_invitation).delete(revoke_invitation))
        .route("/{id}/resend", post(resend_invitation))
}

async fn validate_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitationView>, ApiError> {
    let invitation = state.invitation_service.validate(&token).await?;
    Ok(Json(InvitationView::from(invitation)))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(input): ApiJson<AcceptInvitationInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.invitation_service.accept(&token, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_invitations(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvitationView>>, ApiError> {
    Ok(Json(state.invitation_service.list().await?))
}

async fn create_invitation(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    ApiJson(input): ApiJson<CreateInvitationInput>,
) -> Result<(StatusCode, Json<IssuedInvitation>), ApiError> {
    let issued = state
        .invitation_service
        .create(input, Some(actor.id))
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn get_invitation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InvitationView>, ApiError> {
    let invitation = state.invitation_service.get(id).await?;
    Ok(Json(InvitationView::from(invitation)))
}

async fn revoke_invitation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.invitation_service.revoke(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resend_invitation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<IssuedInvitation>, ApiError> {
    Ok(Json(state.invitation_service.resend(id).await?))
}
