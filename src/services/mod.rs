//! Services layer - Business logic
//!
//! Services validate input, apply defaults and uniqueness rules, and
//! coordinate repositories. Every service reports failures through
//! [`ServiceError`], which the API layer maps onto HTTP status codes.

pub mod author;
pub mod email;
pub mod event;
pub mod gallery;
pub mod hero;
pub mod invitation;
pub mod markdown;
pub mod organization_unit;
pub mod password;
pub mod post;
pub mod rate_limiter;
pub mod slug;
pub mod user;

pub use author::AuthorService;
pub use email::EmailService;
pub use event::EventService;
pub use gallery::GalleryService;
pub use hero::HeroService;
pub use invitation::{InvitationService, IssuedInvitation};
pub use markdown::MarkdownRenderer;
pub use organization_unit::OrganizationUnitService;
pub use password::{hash_password, validate_password_strength, verify_password};
pub use post::PostService;
pub use rate_limiter::LoginRateLimiter;
pub use slug::generate_slug;
pub use user::{normalize_email, UserService};

/// Error type shared by all services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation
    #[error("{0}")]
    Validation(String),

    /// The named resource does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness or state conflict
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Repository failures are internal, except unique-constraint violations:
/// a write that lost a race on a slug or email is a conflict.
impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        let duplicate = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<sqlx::Error>())
            .find_map(|cause| match cause {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    Some(db.message().to_string())
                }
                _ => None,
            });

        match duplicate {
            Some(message) => {
                let field = message
                    .strip_prefix("UNIQUE constraint failed: ")
                    .unwrap_or("value");
                ServiceError::Conflict(format!("A record with this {} already exists", field))
            }
            None => ServiceError::Internal(err),
        }
    }
}

/// Trimmed, non-empty copy of a required text field
pub(crate) fn required_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Apply a partial update to an optional text field. A missing value keeps
/// the current one; a blank value clears it.
pub(crate) fn merge_text(current: Option<String>, update: Option<String>) -> Option<String> {
    match update {
        None => current,
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.trim().to_string()),
    }
}

/// Trim an optional text field, treating blank as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    merge_text(None, value)
}
