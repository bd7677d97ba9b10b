//! Admin route table

use super::RouteDefinition;
use crate::models::UserRole::{self, Admin, Author, Editor};

/// Mount point of the admin API
pub const ADMIN_PREFIX: &str = "/api/admin";

const CONTENT_ROLES: [UserRole; 3] = [Admin, Editor, Author];
const EDITOR_ROLES: [UserRole; 2] = [Admin, Editor];
const ADMIN_ONLY: [UserRole; 1] = [Admin];

/// Every admin resource with the roles allowed to reach it.
///
/// Authors manage posts only; editors additionally manage the landing-page
/// content; user management is reserved for admins.
pub fn admin_routes() -> Vec<RouteDefinition> {
    vec![RouteDefinition::new(ADMIN_PREFIX, CONTENT_ROLES).with_children(vec![
        RouteDefinition::new("/stats", []),
        RouteDefinition::new("/posts", CONTENT_ROLES),
        RouteDefinition::new("/posts/:id", CONTENT_ROLES),
        RouteDefinition::new("/authors", EDITOR_ROLES),
        RouteDefinition::new("/authors/:id", EDITOR_ROLES),
        RouteDefinition::new("/events", EDITOR_ROLES),
        RouteDefinition::new("/events/:id", EDITOR_ROLES),
        RouteDefinition::new("/events/:id/sessions", EDITOR_ROLES),
        RouteDefinition::new("/events/:id/sessions/:session_id", EDITOR_ROLES),
        RouteDefinition::new("/organization-units", EDITOR_ROLES),
        RouteDefinition::new("/organization-units/:id", EDITOR_ROLES),
        RouteDefinition::new("/hero-announcements", EDITOR_ROLES),
        RouteDefinition::new("/hero-announcements/:id", EDITOR_ROLES),
        RouteDefinition::new("/round-table", EDITOR_ROLES),
        RouteDefinition::new("/round-table/:id", EDITOR_ROLES),
        RouteDefinition::new("/users", ADMIN_ONLY),
        RouteDefinition::new("/users/:id", ADMIN_ONLY),
        RouteDefinition::new("/invitations", ADMIN_ONLY),
        RouteDefinition::new("/invitations/:id", ADMIN_ONLY),
        RouteDefinition::new("/invitations/:id/resend", ADMIN_ONLY),
    ])]
}
