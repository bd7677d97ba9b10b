//! HTTP integration tests against an in-memory database

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use orgsite::api::{build_router, AppState};
use orgsite::config::Config;
use orgsite::db::{create_test_pool, migrations};

const ADMIN_EMAIL: &str = "admin@example.org";
const ADMIN_PASSWORD: &str = "admin-password";

async fn setup() -> TestServer {
    let pool = create_test_pool().await.unwrap();
    migrations::run_migrations(&pool).await.unwrap();

    let mut config = Config::default();
    config.bootstrap.admin_email = Some(ADMIN_EMAIL.to_string());
    config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());

    let state = AppState::build(pool, &config).unwrap();
    state
        .user_service
        .ensure_bootstrap_admin(&config.bootstrap)
        .await
        .unwrap();

    TestServer::new(build_router(state, &config.server.cors_origin).unwrap()).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let res = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    res.json::<Value>()["token"].as_str().unwrap().to_string()
}

async fn admin_token(server: &TestServer) -> String {
    login(server, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

/// Invite `email` with `role`, accept the invitation and log in
async fn invited_user_token(server: &TestServer, admin: &str, email: &str, role: &str) -> String {
    let res = server
        .post("/api/admin/invitations")
        .add_header(header::AUTHORIZATION, bearer(admin))
        .json(&json!({ "email": email, "role": role }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body = res.json::<Value>();
    let token = invite_token(&body);

    let res = server
        .post(&format!("/api/invitations/{}/accept", token))
        .json(&json!({ "name": "Invited", "password": "invited-password" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    login(server, email, "invited-password").await
}

fn invite_token(issued: &Value) -> String {
    let url = issued["invite_url"].as_str().unwrap();
    url.rsplit('/').next().unwrap().to_string()
}

fn error_message(res: &TestResponse) -> String {
    res.json::<Value>()["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let server = setup().await;
    let res = server.get("/api/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_admin_requires_session() {
    let server = setup().await;

    let res = server.get("/api/admin/posts").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert!(!error_message(&res).is_empty());

    let res = server
        .get("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer("not-a-session"))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures() {
    let server = setup().await;

    let res = server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&res), "Invalid email or password");

    let res = server
        .post("/api/auth/login")
        .json(&json!({ "email": ADMIN_EMAIL }))
        .await;
    assert!(res.status_code().is_client_error());
}

#[tokio::test]
async fn test_me_and_logout() {
    let server = setup().await;
    let token = admin_token(&server).await;

    let res = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let me = res.json::<Value>();
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert_eq!(me["role"], "admin");
    assert!(me.get("password_hash").is_none());

    let res = server
        .post("/api/auth/logout")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let server = setup().await;
    let token = admin_token(&server).await;

    let cookie = HeaderValue::from_str(&format!("session={}", token)).unwrap();
    let res = server
        .get("/api/admin/stats")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["users"], 1);
}

#[tokio::test]
async fn test_role_checks() {
    let server = setup().await;
    let admin = admin_token(&server).await;
    let author = invited_user_token(&server, &admin, "writer@example.org", "author").await;
    let editor = invited_user_token(&server, &admin, "editor@example.org", "editor").await;

    // Authors may manage posts but nothing else
    let res = server
        .get("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&author))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .get("/api/admin/users")
        .add_header(header::AUTHORIZATION, bearer(&author))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = server
        .get("/api/admin/events")
        .add_header(header::AUTHORIZATION, bearer(&author))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    // Editors manage site content but not accounts
    let res = server
        .get("/api/admin/events")
        .add_header(header::AUTHORIZATION, bearer(&editor))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .post("/api/admin/invitations")
        .add_header(header::AUTHORIZATION, bearer(&editor))
        .json(&json!({ "email": "someone@example.org" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    // Stats inherit the roles of the admin area
    let res = server
        .get("/api/admin/stats")
        .add_header(header::AUTHORIZATION, bearer(&author))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_crud_round_trip() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    let res = server
        .post("/api/admin/authors")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "name": "Dewi Lestari" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let author_id = res.json::<Value>()["id"].as_i64().unwrap();

    let res = server
        .post("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({
            "title": "Hello World",
            "content": "# Welcome\n\nFirst post.",
            "tags": ["news", "News", " campus "],
            "author_ids": [author_id]
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let post = res.json::<Value>();
    let id = post["id"].as_i64().unwrap();
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["status"], "draft");
    assert_eq!(post["tags"], json!(["news", "campus"]));
    assert_eq!(post["authors"][0]["name"], "Dewi Lestari");
    assert!(post["content_html"].as_str().unwrap().contains("<h1>"));

    // Drafts are not public
    let res = server.get("/api/posts/hello-world").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .put(&format!("/api/admin/posts/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "status": "published" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(res.json::<Value>()["published_at"].is_string());

    let res = server.get("/api/posts/hello-world").await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server.get("/api/posts").add_query_param("tag", "campus").await;
    assert_eq!(res.json::<Value>()["total"], 1);

    let res = server
        .post("/api/admin/posts")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "title": "Other", "slug": "hello-world" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);

    let res = server
        .delete(&format!("/api/admin/posts/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = server
        .get(&format!("/api/admin/posts/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(&res), "Post not found");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    let res = server
        .post("/api/admin/authors")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "bio": "no name" }))
        .await;
    assert!(res.status_code().is_client_error());
    assert!(!error_message(&res).is_empty());
}

#[tokio::test]
async fn test_events_with_sessions_and_gallery() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    let res = server
        .post("/api/admin/organization-units")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "name": "Media & Communications" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let unit = res.json::<Value>();
    assert_eq!(unit["slug"], "media-communications");

    let res = server
        .post("/api/admin/events")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({
            "title": "Backwards",
            "start_at": "2030-05-02T10:00:00Z",
            "end_at": "2030-05-01T10:00:00Z"
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/admin/events")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({
            "title": "Leadership Summit",
            "start_at": "2030-05-01T09:00:00Z",
            "end_at": "2030-05-01T17:00:00Z",
            "status": "published",
            "is_featured": true,
            "organization_unit_id": unit["id"]
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let event_id = res.json::<Value>()["id"].as_i64().unwrap();

    let res = server
        .post(&format!("/api/admin/events/{}/sessions", event_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "title": "Opening", "start_at": "2030-05-01T09:00:00Z" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let session_id = res.json::<Value>()["id"].as_i64().unwrap();

    let res = server
        .put(&format!("/api/admin/events/{}/sessions/{}", event_id, session_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "title": "Keynote" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .post("/api/admin/round-table")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "event_id": event_id, "image_url": "/photos/1.jpg" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let res = server
        .get("/api/events")
        .add_query_param("upcoming", "true")
        .add_query_param("featured", "true")
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>().as_array().unwrap().len(), 1);

    let res = server.get("/api/events/leadership-summit").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let detail = res.json::<Value>();
    assert_eq!(detail["organization_unit"]["name"], "Media & Communications");
    assert_eq!(detail["sessions"][0]["title"], "Keynote");
    assert_eq!(detail["gallery"].as_array().unwrap().len(), 1);

    let res = server.get("/api/round-table").await;
    let gallery = res.json::<Value>();
    assert_eq!(gallery[0]["event_slug"], "leadership-summit");

    let res = server.get("/api/organization-units").await;
    assert_eq!(res.json::<Value>().as_array().unwrap().len(), 1);

    let res = server
        .delete(&format!("/api/admin/events/{}", event_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = server.get("/api/round-table").await;
    assert!(res.json::<Value>().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_hero_visibility() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    for body in [
        json!({ "title": "Open Recruitment" }),
        json!({ "title": "Hidden", "is_active": false }),
        json!({ "title": "Past", "ends_at": "2001-01-01T00:00:00Z" }),
    ] {
        let res = server
            .post("/api/admin/hero-announcements")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&body)
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }

    let res = server.get("/api/hero").await;
    let visible = res.json::<Value>();
    assert_eq!(visible.as_array().unwrap().len(), 1);
    assert_eq!(visible[0]["title"], "Open Recruitment");

    let res = server
        .get("/api/admin/hero-announcements")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.json::<Value>().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_invitation_flow() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    let res = server
        .post("/api/admin/invitations")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "email": "New.Member@Example.org", "role": "editor" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let issued = res.json::<Value>();
    assert_eq!(issued["email_sent"], false);
    assert_eq!(issued["invitation"]["status"], "pending");
    assert!(issued["invitation"].get("token").is_none());
    let token = invite_token(&issued);
    assert_eq!(token.len(), 64);

    // A second invitation for the same address is a conflict
    let res = server
        .post("/api/admin/invitations")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "email": "new.member@example.org" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);

    let res = server.get(&format!("/api/invitations/{}", token)).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["email"], "new.member@example.org");

    let res = server.get("/api/invitations/unknown-token").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .post(&format!("/api/invitations/{}/accept", token))
        .json(&json!({ "name": "New Member", "password": "short" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post(&format!("/api/invitations/{}/accept", token))
        .json(&json!({ "name": "New Member", "password": "long-enough" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>()["role"], "editor");

    // The link is single use
    let res = server.get(&format!("/api/invitations/{}", token)).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let member = login(&server, "new.member@example.org", "long-enough").await;
    let res = server
        .get("/api/admin/authors")
        .add_header(header::AUTHORIZATION, bearer(&member))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_invitation_resend_and_revoke() {
    let server = setup().await;
    let admin = admin_token(&server).await;

    let res = server
        .post("/api/admin/invitations")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "email": "later@example.org" }))
        .await;
    let issued = res.json::<Value>();
    let id = issued["invitation"]["id"].as_i64().unwrap();
    let old_token = invite_token(&issued);

    let res = server
        .post(&format!("/api/admin/invitations/{}/resend", id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let new_token = invite_token(&res.json::<Value>());
    assert_ne!(old_token, new_token);

    let res = server.get(&format!("/api/invitations/{}", old_token)).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .delete(&format!("/api/admin/invitations/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = server.get(&format!("/api/invitations/{}", new_token)).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_management() {
    let server = setup().await;
    let admin = admin_token(&server).await;
    let author = invited_user_token(&server, &admin, "writer@example.org", "author").await;

    let res = server
        .get("/api/admin/users")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    let users = res.json::<Value>();
    assert_eq!(users.as_array().unwrap().len(), 2);
    let admin_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == ADMIN_EMAIL)
        .and_then(|u| u["id"].as_i64())
        .unwrap();
    let writer_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "writer@example.org")
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    // Admins cannot delete themselves
    let res = server
        .delete(&format!("/api/admin/users/{}", admin_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    // Disabling a user ends their sessions
    let res = server
        .put(&format!("/api/admin/users/{}", writer_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "status": "disabled" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&author))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .post("/api/auth/login")
        .json(&json!({ "email": "writer@example.org", "password": "invited-password" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = server
        .delete(&format!("/api/admin/users/{}", writer_id))
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
}
