//! User service
//!
//! Dashboard accounts and their sessions:
//! - login / logout with opaque session tokens
//! - session validation with expiry cleanup
//! - user management (role and status changes, deletion)
//! - bootstrap administrator creation on an empty database
//!
//! Accounts are otherwise created only through accepted invitations.

use crate::config::BootstrapConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, UpdateUserInput, User, UserRole, UserStatus};
use crate::services::password::{hash_password, validate_password_strength, verify_password};
use crate::services::{required_text, ServiceError, ServiceResult};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Lowercase and sanity-check an email address
pub fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ServiceError::Validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_days: session_days.max(1),
        }
    }

    /// Check credentials and open a new session
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<(Session, User)> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let password_valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !password_valid {
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active() {
            return Err(ServiceError::Forbidden(
                "Your account has been disabled. Please contact an administrator.".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;
        tracing::info!("User {} logged in", user.id);
        Ok((session, user))
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The user behind a session token, if the session is live and the
    /// account is active. Expired sessions are removed on the way.
    pub async fn validate_session(&self, token: &str) -> ServiceResult<Option<User>> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user.filter(User::is_active))
    }

    pub async fn list(&self) -> ServiceResult<Vec<User>> {
        Ok(self.user_repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<User> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn get_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.user_repo.get_by_email(&email.trim().to_lowercase()).await?)
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.user_repo.count().await?)
    }

    /// Create an account. Used by invitation acceptance and bootstrap.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> ServiceResult<User> {
        let name = required_text(name, "Name")?;
        let email = normalize_email(email)?;
        validate_password_strength(password).map_err(ServiceError::Validation)?;

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A user with email '{}' already exists",
                email
            )));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&User::new(name, email, password_hash, role))
            .await?;
        tracing::info!("Created user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Change a user's name, role or status.
    ///
    /// `actor_id` is the administrator making the change: they may not
    /// demote or disable themselves, and the last active administrator
    /// cannot be demoted or disabled by anyone.
    pub async fn update(
        &self,
        actor_id: i64,
        id: i64,
        input: UpdateUserInput,
    ) -> ServiceResult<User> {
        let mut user = self.get(id).await?;

        let new_role = input.role.unwrap_or(user.role);
        let new_status = input.status.unwrap_or(user.status);
        let loses_admin = user.is_admin()
            && user.is_active()
            && (new_role != UserRole::Admin || new_status != UserStatus::Active);

        if loses_admin {
            if actor_id == id {
                return Err(ServiceError::Validation(
                    "You cannot demote or disable your own account".to_string(),
                ));
            }
            self.ensure_other_admin_remains().await?;
        }

        if let Some(name) = input.name {
            user.name = required_text(&name, "Name")?;
        }
        user.role = new_role;
        user.status = new_status;

        let updated = self.user_repo.update(&user).await?;
        if updated.status == UserStatus::Disabled {
            self.session_repo
                .delete_by_user(updated.id)
                .await
                .context("Failed to revoke sessions")?;
        }
        Ok(updated)
    }

    /// Delete an account and its sessions
    pub async fn delete(&self, actor_id: i64, id: i64) -> ServiceResult<()> {
        if actor_id == id {
            return Err(ServiceError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        let user = self.get(id).await?;
        if user.is_admin() && user.is_active() {
            self.ensure_other_admin_remains().await?;
        }

        self.user_repo.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Create the configured administrator when no user exists yet
    pub async fn ensure_bootstrap_admin(
        &self,
        config: &BootstrapConfig,
    ) -> ServiceResult<Option<User>> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(None);
        };
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(&config.admin_name, email, password, UserRole::Admin)
            .await?;
        tracing::info!("Created bootstrap administrator {}", admin.email);
        Ok(Some(admin))
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> ServiceResult<u64> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    async fn ensure_other_admin_remains(&self) -> ServiceResult<()> {
        if self.user_repo.count_active_admins().await? <= 1 {
            return Err(ServiceError::Conflict(
                "At least one active administrator is required".to_string(),
            ));
        }
        Ok(())
    }

    async fn create_session(&self, user_id: i64) -> ServiceResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_days),
            created_at: now,
        };
        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}
