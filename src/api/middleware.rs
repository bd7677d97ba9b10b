//! API middleware
//!
//! Contains:
//! - shared application state
//! - the JSON error type and its mapping from service errors
//! - authentication (session token validation)
//! - authorization against the admin route table

use axum::{
    extract::{rejection::JsonRejection, FromRequest, OriginalUri, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxAuthorRepository, SqlxEventRepository, SqlxEventSessionRepository, SqlxGalleryRepository,
    SqlxHeroRepository, SqlxInvitationRepository, SqlxOrganizationUnitRepository,
    SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DbPool;
use crate::models::User;
use crate::routing::{admin_routes, RouteMatcher};
use crate::services::{
    AuthorService, EmailService, EventService, GalleryService, HeroService, InvitationService,
    LoginRateLimiter, OrganizationUnitService, PostService, ServiceError, UserService,
};

/// Name of the session cookie set at login
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub user_service: Arc<UserService>,
    pub invitation_service: Arc<InvitationService>,
    pub post_service: Arc<PostService>,
    pub author_service: Arc<AuthorService>,
    pub event_service: Arc<EventService>,
    pub gallery_service: Arc<GalleryService>,
    pub hero_service: Arc<HeroService>,
    pub unit_service: Arc<OrganizationUnitService>,
    pub route_matcher: Arc<RouteMatcher>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    /// Lifetime of the session cookie
    pub session_days: i64,
}

impl AppState {
    /// Wire repositories and services on top of `pool`
    pub fn build(pool: DbPool, config: &Config) -> anyhow::Result<Self> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let event_repo = SqlxEventRepository::boxed(pool.clone());
        let gallery_repo = SqlxGalleryRepository::boxed(pool.clone());
        let unit_repo = SqlxOrganizationUnitRepository::boxed(pool.clone());

        let user_service = Arc::new(UserService::new(
            user_repo,
            session_repo,
            config.auth.session_days,
        ));
        let email_service = Arc::new(EmailService::new(config.mail.clone(), &config.site.name));
        if !email_service.is_enabled() {
            tracing::warn!("SMTP is not configured; invitation links must be shared manually");
        }
        let invitation_service = Arc::new(InvitationService::new(
            SqlxInvitationRepository::boxed(pool.clone()),
            user_service.clone(),
            email_service,
            &config.site.base_url,
            config.invitation.expiry_hours,
        ));

        Ok(Self {
            user_service,
            invitation_service,
            post_service: Arc::new(PostService::new(
                SqlxPostRepository::boxed(pool.clone()),
                author_repo.clone(),
            )),
            author_service: Arc::new(AuthorService::new(author_repo)),
            event_service: Arc::new(EventService::new(
                event_repo.clone(),
                SqlxEventSessionRepository::boxed(pool.clone()),
                gallery_repo.clone(),
                unit_repo.clone(),
            )),
            gallery_service: Arc::new(GalleryService::new(gallery_repo, event_repo)),
            hero_service: Arc::new(HeroService::new(SqlxHeroRepository::boxed(pool.clone()))),
            unit_service: Arc::new(OrganizationUnitService::new(unit_repo)),
            route_matcher: Arc::new(RouteMatcher::new(&admin_routes())?),
            rate_limiter: Arc::new(LoginRateLimiter::from_config(&config.auth)),
            session_days: config.auth.session_days,
            pool,
        })
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response body: `{"error": "<message>"}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Unauthorized(msg) => Self::unauthorized(msg),
            ServiceError::Forbidden(msg) => Self::forbidden(msg),
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API error format
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Session token from `Authorization: Bearer` or the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    if name == SESSION_COOKIE && !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Role check against the admin route table.
///
/// A matched route lets through the roles it lists. Admin paths missing
/// from the table are reserved for administrators.
pub async fn require_route_role(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user_id, role) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| (user.0.id, user.0.role))
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let path = match request.extensions().get::<OriginalUri>() {
        Some(original) => original.path().to_string(),
        None => request.uri().path().to_string(),
    };

    let route = state.route_matcher.match_path(&path);
    let allowed = if route.matched {
        route.permits(role)
    } else {
        role == crate::models::UserRole::Admin
    };

    if !allowed {
        tracing::warn!("User {} ({}) denied access to {}", user_id, role, path);
        return Err(ApiError::forbidden("Insufficient privileges"));
    }

    Ok(next.run(request).await)
}
