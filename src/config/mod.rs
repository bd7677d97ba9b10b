//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file, then overridden by
//! `ORGSITE_*` environment variables. Missing values fall back to defaults,
//! so an empty or absent file yields a working development setup.

use serde::{Deserialize, Serialize};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "ORGSITE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub invitation: InvitationConfig,
    /// Initial administrator, created only when the users table is empty
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the dashboard front-end, cookies are sent)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, `sqlite:` URL or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/orgsite.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Public site information, used to build links in outgoing mail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Public URL of the front-end (no trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            base_url: default_base_url(),
        }
    }
}

fn default_site_name() -> String {
    "Student Organization".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// SMTP settings. An empty `smtp_host` disables outgoing mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_site_name")]
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
            from_name: default_site_name(),
        }
    }
}

impl MailConfig {
    /// Whether an SMTP relay has been configured
    pub fn is_enabled(&self) -> bool {
        !self.smtp_host.trim().is_empty()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "no-reply@localhost".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Failed logins per email before the account is locked out
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: usize,
    /// Lockout window in minutes
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            max_login_attempts: default_max_login_attempts(),
            lockout_minutes: default_lockout_minutes(),
        }
    }
}

fn default_session_days() -> i64 {
    7
}

fn default_max_login_attempts() -> usize {
    5
}

fn default_lockout_minutes() -> i64 {
    15
}

/// Invitation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Hours an invitation link stays valid
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_hours: default_expiry_hours(),
        }
    }
}

fn default_expiry_hours() -> i64 {
    72
}

/// Bootstrap administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_email: None,
            admin_password: None,
            admin_name: default_admin_name(),
        }
    }
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults. Invalid YAML is an error
    /// carrying the line and column of the problem.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, then apply `ORGSITE_*` overrides
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server misbehave at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_days <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_days must be positive".to_string(),
            ));
        }
        if self.invitation.expiry_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "invitation.expiry_hours must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("SERVER_PORT") {
            self.server.port = port;
        }
        if let Some(origin) = env_var("SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        if let Some(url) = env_var("DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(base_url) = env_var("SITE_BASE_URL") {
            self.site.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(host) = env_var("MAIL_SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Some(port) = env_parse("MAIL_SMTP_PORT") {
            self.mail.smtp_port = port;
        }
        if let Some(username) = env_var("MAIL_USERNAME") {
            self.mail.username = username;
        }
        if let Some(password) = env_var("MAIL_PASSWORD") {
            self.mail.password = password;
        }
        if let Some(from) = env_var("MAIL_FROM") {
            self.mail.from_address = from;
        }

        if let Some(days) = env_parse("AUTH_SESSION_DAYS") {
            self.auth.session_days = days;
        }
        if let Some(hours) = env_parse("INVITATION_EXPIRY_HOURS") {
            self.invitation.expiry_hours = hours;
        }

        if let Some(email) = env_var("BOOTSTRAP_ADMIN_EMAIL") {
            self.bootstrap.admin_email = Some(email);
        }
        if let Some(password) = env_var("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(password);
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

/// Parse an override; unparsable values are ignored
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OVERRIDES: &[&str] = &[
        "SERVER_HOST",
        "SERVER_PORT",
        "SERVER_CORS_ORIGIN",
        "DATABASE_URL",
        "SITE_BASE_URL",
        "MAIL_SMTP_HOST",
        "MAIL_SMTP_PORT",
        "MAIL_USERNAME",
        "MAIL_PASSWORD",
        "MAIL_FROM",
        "AUTH_SESSION_DAYS",
        "INVITATION_EXPIRY_HOURS",
        "BOOTSTRAP_ADMIN_EMAIL",
        "BOOTSTRAP_ADMIN_PASSWORD",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        clear_env();
        guard
    }

    fn clear_env() {
        for name in OVERRIDES {
            std::env::remove_var(format!("{}{}", ENV_PREFIX, name));
        }
    }

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(std::path::Path::new("nonexistent_config.yml")).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/orgsite.db");
        assert_eq!(config.auth.session_days, 7);
        assert_eq!(config.invitation.expiry_hours, 72);
        assert!(!config.mail.is_enabled());
        assert!(config.bootstrap.admin_email.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let file = config_file("");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let file = config_file("server:\n  port: 3001\nmail:\n  smtp_host: smtp.example.org\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.mail.is_enabled());
        assert_eq!(config.mail.smtp_port, 587);
    }

    #[test]
    fn test_load_full_config() {
        let file = config_file(
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origin: "https://org.example.ac.id"
database:
  url: "sqlite:/var/lib/orgsite/site.db"
  max_connections: 5
site:
  name: "Himpunan"
  base_url: "https://org.example.ac.id"
auth:
  session_days: 14
invitation:
  expiry_hours: 24
bootstrap:
  admin_email: "root@example.org"
  admin_password: "change-me-please"
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.cors_origin, "https://org.example.ac.id");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.site.name, "Himpunan");
        assert_eq!(config.auth.session_days, 14);
        assert_eq!(config.invitation.expiry_hours, 24);
        assert_eq!(
            config.bootstrap.admin_email.as_deref(),
            Some("root@example.org")
        );
        assert_eq!(config.bootstrap.admin_name, "Administrator");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let file = config_file("server:\n  port: not_a_number\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_load_rejects_non_positive_expiry() {
        let file = config_file("invitation:\n  expiry_hours: 0\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("expiry_hours"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();
        let file = config_file("server:\n  port: 8080\n");

        std::env::set_var("ORGSITE_SERVER_HOST", "192.168.1.1");
        std::env::set_var("ORGSITE_SERVER_PORT", "4000");
        std::env::set_var("ORGSITE_SITE_BASE_URL", "https://example.org/");
        std::env::set_var("ORGSITE_INVITATION_EXPIRY_HOURS", "12");
        std::env::set_var("ORGSITE_BOOTSTRAP_ADMIN_EMAIL", "admin@example.org");

        let config = Config::load_with_env(file.path()).unwrap();
        clear_env();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.site.base_url, "https://example.org");
        assert_eq!(config.invitation.expiry_hours, 12);
        assert_eq!(
            config.bootstrap.admin_email.as_deref(),
            Some("admin@example.org")
        );
    }

    #[test]
    fn test_env_override_invalid_number_ignored() {
        let _guard = lock_env();
        let file = config_file("server:\n  port: 8080\n");

        std::env::set_var("ORGSITE_SERVER_PORT", "not_a_number");
        let config = Config::load_with_env(file.path()).unwrap();
        clear_env();

        assert_eq!(config.server.port, 8080);
    }
}
