//! User invitation repository

use crate::db::DbPool;
use crate::models::{UserInvitation, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

const INVITATION_COLUMNS: &str =
    "id, email, role, token, invited_by, expires_at, accepted_at, created_at";

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, invitation: &UserInvitation) -> Result<UserInvitation>;
    async fn get_by_id(&self, id: i64) -> Result<Option<UserInvitation>>;
    async fn get_by_token(&self, token: &str) -> Result<Option<UserInvitation>>;
    /// Unaccepted, unexpired invitation for `email`, if any
    async fn get_pending_by_email(&self, email: &str) -> Result<Option<UserInvitation>>;
    /// All invitations, newest first
    async fn list(&self) -> Result<Vec<UserInvitation>>;
    /// Persist token, role, expiry and acceptance time
    async fn update(&self, invitation: &UserInvitation) -> Result<UserInvitation>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// Remove expired invitations that were never accepted
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
    async fn count_pending(&self, now: DateTime<Utc>) -> Result<i64>;
}

pub struct SqlxInvitationRepository {
    pool: DbPool,
}

impl SqlxInvitationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn InvitationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InvitationRepository for SqlxInvitationRepository {
    async fn create(&self, invitation: &UserInvitation) -> Result<UserInvitation> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO user_invitations (email, role, token, invited_by, expires_at, accepted_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invitation.email)
        .bind(invitation.role.to_string())
        .bind(&invitation.token)
        .bind(invitation.invited_by)
        .bind(invitation.expires_at)
        .bind(invitation.accepted_at)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create invitation")?;

        Ok(UserInvitation {
            id: result.last_insert_rowid(),
            created_at: now,
            ..invitation.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<UserInvitation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_invitations WHERE id = ?",
            INVITATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get invitation")?;

        row.map(|r| row_to_invitation(&r)).transpose()
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<UserInvitation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_invitations WHERE token = ?",
            INVITATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get invitation by token")?;

        row.map(|r| row_to_invitation(&r)).transpose()
    }

    async fn get_pending_by_email(&self, email: &str) -> Result<Option<UserInvitation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_invitations \
             WHERE email = ? AND accepted_at IS NULL AND expires_at > ? \
             ORDER BY id DESC LIMIT 1",
            INVITATION_COLUMNS
        ))
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get pending invitation")?;

        row.map(|r| row_to_invitation(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<UserInvitation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM user_invitations ORDER BY created_at DESC, id DESC",
            INVITATION_COLUMNS
        ))
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list invitations")?;

        rows.iter().map(row_to_invitation).collect()
    }

    async fn update(&self, invitation: &UserInvitation) -> Result<UserInvitation> {
        sqlx::query(
            r#"
            UPDATE user_invitations
            SET role = ?, token = ?, expires_at = ?, accepted_at = ?
            WHERE id = ?
            "#,
        )
        .bind(invitation.role.to_string())
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.accepted_at)
        .bind(invitation.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update invitation")?;

        self.get_by_id(invitation.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Invitation not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM user_invitations WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete invitation")?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM user_invitations WHERE accepted_at IS NULL AND expires_at <= ?",
        )
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to delete expired invitations")?;
        Ok(result.rows_affected())
    }

    async fn count_pending(&self, now: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM user_invitations WHERE accepted_at IS NULL AND expires_at > ?",
        )
        .bind(now)
        .fetch_one(self.pool.pool())
        .await
        .context("Failed to count pending invitations")?;
        Ok(row.get("count"))
    }
}

fn row_to_invitation(row: &sqlx::sqlite::SqliteRow) -> Result<UserInvitation> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(UserInvitation {
        id: row.get("id"),
        email: row.get("email"),
        role,
        token: row.get("token"),
        invited_by: row.get("invited_by"),
        expires_at: row.get("expires_at"),
        accepted_at: row.get("accepted_at"),
        created_at: row.get("created_at"),
    })
}
