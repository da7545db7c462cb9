//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Email (SMTP) configuration.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Slack webhook configuration.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Attachment storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// SMTP configuration for owner notifications.
///
/// When `host` is unset, outgoing mail is logged instead of sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host.
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP server port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address for outgoing mail.
    #[serde(default = "default_smtp_from")]
    pub from: String,
}

/// Slack incoming-webhook configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackConfig {
    /// Webhook URL. Unset disables Slack notifications.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Attachment blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Base directory for stored attachment blobs.
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    /// Base URL under which blobs are served.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// Maximum accepted attachment size in bytes.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "worklog@localhost".to_string()
}

fn default_storage_path() -> String {
    "./uploads".to_string()
}

fn default_storage_url() -> String {
    "/api/reports/uploads".to_string()
}

const fn default_max_attachment_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `WORKLOG_ENV`)
    /// 3. Environment variables with `WORKLOG_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("WORKLOG_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WORKLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        config.try_deserialize()
    }
}
