//! Invitation service
//!
//! Lifecycle of dashboard invitations: create and mail a link, validate
//! the link, accept it (creating the account), resend with a fresh token,
//! revoke, and purge expired leftovers.

use crate::db::repositories::InvitationRepository;
use crate::models::{
    AcceptInvitationInput, CreateInvitationInput, InvitationStatus, InvitationView, User,
    UserInvitation,
};
use crate::services::{normalize_email, EmailService, ServiceError, ServiceResult, UserService};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// An invitation as returned right after it was (re)issued
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvitation {
    pub invitation: InvitationView,
    /// Link to hand out manually when mail delivery failed
    pub invite_url: String,
    pub email_sent: bool,
}

pub struct InvitationService {
    invitation_repo: Arc<dyn InvitationRepository>,
    user_service: Arc<UserService>,
    email_service: Arc<EmailService>,
    base_url: String,
    expiry_hours: i64,
}

impl InvitationService {
    pub fn new(
        invitation_repo: Arc<dyn InvitationRepository>,
        user_service: Arc<UserService>,
        email_service: Arc<EmailService>,
        base_url: &str,
        expiry_hours: i64,
    ) -> Self {
        Self {
            invitation_repo,
            user_service,
            email_service,
            base_url: base_url.trim_end_matches('/').to_string(),
            expiry_hours: expiry_hours.max(1),
        }
    }

    /// Invite `input.email` with the given role (default author)
    pub async fn create(
        &self,
        input: CreateInvitationInput,
        invited_by: Option<i64>,
    ) -> ServiceResult<IssuedInvitation> {
        let email = normalize_email(&input.email)?;
        self.ensure_invitable(&email, None).await?;

        let now = Utc::now();
        let invitation = UserInvitation {
            id: 0,
            email,
            role: input.role.unwrap_or_default(),
            token: generate_token(),
            invited_by,
            expires_at: now + Duration::hours(self.expiry_hours),
            accepted_at: None,
            created_at: now,
        };
        let created = self.invitation_repo.create(&invitation).await?;
        tracing::info!("Created invitation {} for {}", created.id, created.email);

        Ok(self.deliver(created).await)
    }

    /// The invitation behind `token`, if it can still be accepted
    pub async fn validate(&self, token: &str) -> ServiceResult<UserInvitation> {
        let invitation = self
            .invitation_repo
            .get_by_token(token)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?;

        match invitation.status() {
            InvitationStatus::Pending => Ok(invitation),
            InvitationStatus::Accepted => Err(ServiceError::Validation(
                "This invitation has already been accepted".to_string(),
            )),
            InvitationStatus::Expired => Err(ServiceError::Validation(
                "This invitation has expired".to_string(),
            )),
        }
    }

    /// Create the invited account and mark the invitation accepted
    pub async fn accept(&self, token: &str, input: AcceptInvitationInput) -> ServiceResult<User> {
        let mut invitation = self.validate(token).await?;

        let user = self
            .user_service
            .create_user(&input.name, &invitation.email, &input.password, invitation.role)
            .await?;

        invitation.accepted_at = Some(Utc::now());
        self.invitation_repo.update(&invitation).await?;
        tracing::info!("Invitation {} accepted by user {}", invitation.id, user.id);
        Ok(user)
    }

    /// Issue a fresh token and expiry for a pending or expired invitation
    pub async fn resend(&self, id: i64) -> ServiceResult<IssuedInvitation> {
        let mut invitation = self.get(id).await?;
        if invitation.accepted_at.is_some() {
            return Err(ServiceError::Validation(
                "This invitation has already been accepted".to_string(),
            ));
        }
        self.ensure_invitable(&invitation.email, Some(invitation.id))
            .await?;

        invitation.token = generate_token();
        invitation.expires_at = Utc::now() + Duration::hours(self.expiry_hours);
        let updated = self.invitation_repo.update(&invitation).await?;
        tracing::info!("Reissued invitation {} for {}", updated.id, updated.email);

        Ok(self.deliver(updated).await)
    }

    /// Delete an invitation, invalidating its link
    pub async fn revoke(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.invitation_repo.delete(id).await?;
        tracing::info!("Revoked invitation {}", id);
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ServiceResult<UserInvitation> {
        self.invitation_repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))
    }

    /// All invitations with their derived status, newest first
    pub async fn list(&self) -> ServiceResult<Vec<InvitationView>> {
        let invitations = self.invitation_repo.list().await?;
        Ok(invitations.into_iter().map(InvitationView::from).collect())
    }

    pub async fn count_pending(&self) -> ServiceResult<i64> {
        Ok(self.invitation_repo.count_pending(Utc::now()).await?)
    }

    /// Delete expired, unaccepted invitations
    pub async fn purge_expired(&self) -> ServiceResult<u64> {
        Ok(self.invitation_repo.delete_expired(Utc::now()).await?)
    }

    pub fn invite_url(&self, token: &str) -> String {
        format!("{}/invite/{}", self.base_url, token)
    }

    /// Reject emails that already have an account or another pending invitation
    async fn ensure_invitable(&self, email: &str, invitation_id: Option<i64>) -> ServiceResult<()> {
        if self.user_service.get_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A user with email '{}' already exists",
                email
            )));
        }
        let other_pending = self
            .invitation_repo
            .get_pending_by_email(email)
            .await?
            .filter(|pending| Some(pending.id) != invitation_id);
        if other_pending.is_some() {
            return Err(ServiceError::Conflict(format!(
                "An invitation for '{}' is already pending",
                email
            )));
        }
        Ok(())
    }

    /// Mail the link. Delivery failure is logged and reported, not raised.
    async fn deliver(&self, invitation: UserInvitation) -> IssuedInvitation {
        let invite_url = self.invite_url(&invitation.token);
        let email_sent = match self
            .email_service
            .send_invitation(&invitation.email, invitation.role, &invite_url, self.expiry_hours)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Invitation mail to {} not sent: {}", invitation.email, e);
                false
            }
        };

        IssuedInvitation {
            invitation: InvitationView::from(invitation),
            invite_url,
            email_sent,
        }
    }
}

/// 64 hex characters of randomness
fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::repositories::{
        SqlxInvitationRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DbPool};
    use crate::models::UserRole;

    async fn setup() -> (InvitationService, Arc<UserService>, DbPool) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let users = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            7,
        ));
        let service = InvitationService::new(
            SqlxInvitationRepository::boxed(pool.clone()),
            users.clone(),
            Arc::new(EmailService::new(MailConfig::default(), "Club")),
            "http://localhost:3000/",
            72,
        );
        (service, users, pool)
    }

    fn invite(email: &str, role: Option<UserRole>) -> CreateInvitationInput {
        CreateInvitationInput {
            email: email.to_string(),
            role,
        }
    }

    fn accept_input() -> AcceptInvitationInput {
        AcceptInvitationInput {
            name: "New Member".into(),
            password: "password123".into(),
        }
    }

    #[test]
    fn test_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_create_reports_link_when_mail_disabled() {
        let (service, _users, _pool) = setup().await;
        let issued = service
            .create(invite("New@Example.com", Some(UserRole::Editor)), None)
            .await
            .unwrap();

        assert!(!issued.email_sent);
        assert_eq!(issued.invitation.status, InvitationStatus::Pending);
        assert_eq!(issued.invitation.invitation.email, "new@example.com");
        assert_eq!(issued.invitation.invitation.role, UserRole::Editor);
        assert!(issued.invite_url.starts_with("http://localhost:3000/invite/"));
        assert!(issued.invite_url.ends_with(&issued.invitation.invitation.token));
    }

    #[tokio::test]
    async fn test_duplicate_pending_invitation_conflicts() {
        let (service, _users, _pool) = setup().await;
        service.create(invite("a@example.com", None), None).await.unwrap();
        let err = service.create(invite("A@example.com", None), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_existing_user_cannot_be_invited() {
        let (service, users, _pool) = setup().await;
        users
            .create_user("Ana", "ana@example.com", "password123", UserRole::Author)
            .await
            .unwrap();
        let err = service.create(invite("ana@example.com", None), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_accept_creates_user_with_invited_role() {
        let (service, users, _pool) = setup().await;
        let issued = service
            .create(invite("b@example.com", Some(UserRole::Editor)), None)
            .await
            .unwrap();
        let token = issued.invitation.invitation.token.clone();

        assert!(service.validate(&token).await.is_ok());
        let user = service.accept(&token, accept_input()).await.unwrap();
        assert_eq!(user.role, UserRole::Editor);
        assert_eq!(user.email, "b@example.com");

        let (_, logged_in) = users.login("b@example.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let err = service.accept(&token, accept_input()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.list().await.unwrap()[0].status, InvitationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let (service, _users, _pool) = setup().await;
        let err = service.validate("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_invitation_can_be_resent() {
        let (service, _users, pool) = setup().await;
        let issued = service.create(invite("c@example.com", None), None).await.unwrap();
        let old_token = issued.invitation.invitation.token.clone();

        let repo = SqlxInvitationRepository::new(pool);
        let mut stored = repo.get_by_id(issued.invitation.invitation.id).await.unwrap().unwrap();
        stored.expires_at = Utc::now() - Duration::hours(1);
        repo.update(&stored).await.unwrap();

        let err = service.validate(&old_token).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let resent = service.resend(stored.id).await.unwrap();
        let new_token = resent.invitation.invitation.token.clone();
        assert_ne!(new_token, old_token);
        assert_eq!(resent.invitation.status, InvitationStatus::Pending);
        assert!(service.validate(&new_token).await.is_ok());
        assert!(service.validate(&old_token).await.is_err());
    }

    #[tokio::test]
    async fn test_resend_rejected_when_email_taken_again() {
        let (service, users, pool) = setup().await;
        let first = service.create(invite("z@example.com", None), None).await.unwrap();

        let repo = SqlxInvitationRepository::new(pool);
        let mut stored = repo.get_by_id(first.invitation.invitation.id).await.unwrap().unwrap();
        stored.expires_at = Utc::now() - Duration::hours(1);
        repo.update(&stored).await.unwrap();

        // A newer invitation for the same address blocks reviving the old one
        let second = service.create(invite("z@example.com", None), None).await.unwrap();
        let err = service.resend(stored.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(service.count_pending().await.unwrap(), 1);

        // So does the account created from it
        service
            .accept(&second.invitation.invitation.token, accept_input())
            .await
            .unwrap();
        assert!(users.get_by_email("z@example.com").await.unwrap().is_some());
        let err = service.resend(stored.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_resend_pending_invitation_keeps_working() {
        let (service, _users, _pool) = setup().await;
        let issued = service.create(invite("y@example.com", None), None).await.unwrap();
        let resent = service.resend(issued.invitation.invitation.id).await.unwrap();
        assert!(service.validate(&resent.invitation.invitation.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_and_purge() {
        let (service, _users, pool) = setup().await;
        let kept = service.create(invite("d@example.com", None), None).await.unwrap();
        let stale = service.create(invite("e@example.com", None), None).await.unwrap();

        let repo = SqlxInvitationRepository::new(pool);
        let mut stored = repo.get_by_id(stale.invitation.invitation.id).await.unwrap().unwrap();
        stored.expires_at = Utc::now() - Duration::hours(1);
        repo.update(&stored).await.unwrap();

        assert_eq!(service.count_pending().await.unwrap(), 1);
        assert_eq!(service.purge_expired().await.unwrap(), 1);

        service.revoke(kept.invitation.invitation.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
        let err = service.revoke(kept.invitation.invitation.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
