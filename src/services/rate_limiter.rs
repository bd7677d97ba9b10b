//! Rate limiter for login attempts
//!
//! Failed logins are counted per email address inside a sliding lockout
//! window, and login requests are counted per client IP per minute.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AuthConfig;

/// Login requests allowed per IP address per minute
const IP_REQUESTS_PER_MINUTE: usize = 10;

/// Login rate limiter
pub struct LoginRateLimiter {
    max_attempts: usize,
    lockout: Duration,
    /// Failed login attempts by email
    email_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    /// Login requests by IP address
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, lockout_minutes: i64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout: Duration::minutes(lockout_minutes.max(1)),
            email_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.max_login_attempts, config.lockout_minutes)
    }

    /// Whether too many recent logins for `email` have failed
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let mut attempts = self.email_attempts.write().await;
        let cutoff = Utc::now() - self.lockout;

        let email_attempts = attempts.entry(email.to_lowercase()).or_default();
        email_attempts.retain(|time| *time > cutoff);
        email_attempts.len() >= self.max_attempts
    }

    pub async fn record_failed_attempt(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures for `email` after a successful login
    pub async fn clear_email_attempts(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts.remove(&email.to_lowercase());
    }

    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(1);

        let ip_attempts = attempts.entry(ip).or_default();
        ip_attempts.retain(|time| *time > cutoff);
        ip_attempts.len() >= IP_REQUESTS_PER_MINUTE
    }

    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop stale entries. Called periodically from the cleanup task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - self.lockout;
        let ip_cutoff = now - Duration::minutes(1);

        {
            let mut attempts = self.email_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > email_cutoff);
                !times.is_empty()
            });
        }

        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}
