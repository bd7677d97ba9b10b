//! Authentication API endpoints
//!
//! - POST /api/auth/login - Log in with email and password
//! - POST /api/auth/logout - End the current session
//! - GET /api/auth/me - Current user
//!
//! Login is rate limited per client IP and per email address. The session
//! token is returned in the body and set as an HttpOnly cookie.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::api::middleware::{
    extract_session_token, ApiError, ApiJson, AppState, AuthenticatedUser, SESSION_COOKIE,
};
use crate::models::User;
use crate::services::ServiceError;

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Routes that do not need a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes behind the auth middleware
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(current_user))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    if let Some(ip) = extract_ip_address(&headers) {
        if state.rate_limiter.is_ip_limited(ip).await {
            tracing::warn!("Login rate limit hit for {}", ip);
            return Err(ApiError::too_many_requests(
                "Too many requests, please try again later",
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state.rate_limiter.is_email_limited(&email).await {
        tracing::warn!("Login locked out for {}", email);
        return Err(ApiError::too_many_requests(
            "Too many failed login attempts, please try again later",
        ));
    }

    let (session, user) = match state.user_service.login(&email, &body.password).await {
        Ok(result) => result,
        Err(err) => {
            if matches!(err, ServiceError::Unauthorized(_)) {
                state.rate_limiter.record_failed_attempt(&email).await;
            }
            return Err(err.into());
        }
    };
    state.rate_limiter.clear_email_attempts(&email).await;
    tracing::info!("User {} logged in", user.id);

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session.id,
        state.session_days * 24 * 60 * 60
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::internal_error("Failed to build session cookie"))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user,
            token: session.id,
            expires_at: session.expires_at,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let clear_cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    let clear_cookie = HeaderValue::from_str(&clear_cookie)
        .map_err(|_| ApiError::internal_error("Failed to build session cookie"))?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, clear_cookie)]))
}

async fn current_user(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<User> {
    Json(user)
}

/// Client IP as reported by the reverse proxy
fn extract_ip_address(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return ip.trim().parse().ok();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
