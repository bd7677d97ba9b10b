//! User invitation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserRole;

/// Pending or settled invitation to join the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInvitation {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    /// Secret part of the invitation link, only ever sent by mail
    #[serde(skip_serializing, default)]
    pub token: String,
    pub invited_by: Option<i64>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserInvitation {
    /// Status as of `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.accepted_at.is_some() {
            InvitationStatus::Accepted
        } else if self.expires_at <= now {
            InvitationStatus::Expired
        } else {
            InvitationStatus::Pending
        }
    }

    pub fn status(&self) -> InvitationStatus {
        self.status_at(Utc::now())
    }
}

/// Derived invitation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Invitation with its derived status, as listed in the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: UserInvitation,
    pub status: InvitationStatus,
}

impl From<UserInvitation> for InvitationView {
    fn from(invitation: UserInvitation) -> Self {
        let status = invitation.status();
        Self { invitation, status }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvitationInput {
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInvitationInput {
    pub name: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(expires_in: Duration, accepted: bool) -> UserInvitation {
        let now = Utc::now();
        UserInvitation {
            id: 1,
            email: "new@example.org".to_string(),
            role: UserRole::Editor,
            token: "t".repeat(64),
            invited_by: Some(1),
            expires_at: now + expires_in,
            accepted_at: accepted.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn test_status_derivation() {
        let now = Utc::now();
        assert_eq!(
            invitation(Duration::hours(1), false).status_at(now),
            InvitationStatus::Pending
        );
        assert_eq!(
            invitation(Duration::hours(-1), false).status_at(now),
            InvitationStatus::Expired
        );
        // Accepted wins over expiry
        assert_eq!(
            invitation(Duration::hours(-1), true).status_at(now),
            InvitationStatus::Accepted
        );
    }

    #[test]
    fn test_view_hides_token() {
        let view = InvitationView::from(invitation(Duration::hours(1), false));
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["email"], "new@example.org");
    }
}
