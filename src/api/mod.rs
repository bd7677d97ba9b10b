//! API layer - HTTP handlers and routing
//!
//! Public endpoints feed the landing page and the invitation link; admin
//! endpoints under `/api/admin` require a session and pass the role check
//! of the admin route table.

pub mod admin;
pub mod auth;
pub mod authors;
pub mod common;
pub mod events;
pub mod hero;
pub mod invitations;
pub mod middleware;
pub mod organization_units;
pub mod posts;
pub mod round_table;
pub mod users;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};

/// Build the router mounted at `/api`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Every admin route needs a session, then a role allowed by the route table
    let admin_routes = Router::new()
        .merge(admin::router())
        .nest("/posts", posts::admin_router())
        .nest("/authors", authors::admin_router())
        .nest("/events", events::admin_router())
        .nest("/organization-units", organization_units::admin_router())
        .nest("/hero-announcements", hero::admin_router())
        .nest("/round-table", round_table::admin_router())
        .nest("/users", users::admin_router())
        .nest("/invitations", invitations::admin_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_route_role,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/hero", hero::public_router())
        .nest("/posts", posts::public_router())
        .nest("/events", events::public_router())
        .nest("/organization-units", organization_units::public_router())
        .nest("/round-table", round_table::public_router())
        .nest("/invitations", invitations::public_router())
        .nest("/auth", auth::public_router())
        .merge(protected_routes)
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    // Cookie authentication needs credentials and an explicit origin
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Ok(Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// GET /api/health - Liveness including a database round trip
async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.pool.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {:#}", e);
        ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
        )
    })?;
    Ok(Json(json!({ "status": "ok" })))
}
