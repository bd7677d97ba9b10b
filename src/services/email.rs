//! Outgoing mail
//!
//! Invitation links are delivered over SMTP with lettre's async transport.
//! Without an SMTP host every send fails with a "not configured" error and
//! callers decide whether that is fatal.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::models::UserRole;

/// SMTP mail sender
pub struct EmailService {
    config: MailConfig,
    site_name: String,
}

impl EmailService {
    pub fn new(config: MailConfig, site_name: impl Into<String>) -> Self {
        Self {
            config,
            site_name: site_name.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Send the invitation link for a new dashboard account
    pub async fn send_invitation(
        &self,
        to_email: &str,
        role: UserRole,
        invite_url: &str,
        expiry_hours: i64,
    ) -> Result<()> {
        let subject = format!("[{}] You're invited to the dashboard", self.site_name);
        let body = format!(
            "Hello!\n\n\
             You have been invited to join the {site} dashboard as {role}.\n\n\
             Accept the invitation and choose your password here:\n{url}\n\n\
             This link expires in {hours} hours. If you did not expect this \
             invitation you can ignore this message.\n\n\
             {site}",
            site = self.site_name,
            role = role,
            url = invite_url,
            hours = expiry_hours,
        );

        self.send(to_email, subject, body).await
    }

    async fn send(&self, to_email: &str, subject: String, body: String) -> Result<()> {
        if !self.config.is_enabled() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_address);
        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);
        if !self.config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ));
        }
        let mailer = builder.build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::info!("Sent mail to {}", to_email);
        Ok(())
    }
}
