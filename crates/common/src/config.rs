//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Security configuration.
    pub security: SecurityConfig,
    /// Attachment upload configuration.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Report lifecycle policy.
    #[serde(default)]
    pub reports: ReportPolicyConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional administrator bootstrap.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
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
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Only enable behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy: bool,
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

/// Security configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Secret key for hashing client addresses.
    pub ip_hash_secret: String,
    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

/// Attachment upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory attachments are written to.
    #[serde(default = "default_upload_path")]
    pub base_path: PathBuf,
    /// URL prefix attachments are served from.
    #[serde(default = "default_upload_url")]
    pub base_url: String,
    /// Maximum size of a single attachment in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Maximum number of attachments per report.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl UploadConfig {
    /// Largest request body a submission may need: every attachment at full
    /// size plus `overhead` for the remaining form fields.
    #[must_use]
    pub fn request_body_limit(&self, overhead: usize) -> usize {
        usize::try_from(self.max_file_bytes)
            .unwrap_or(usize::MAX)
            .saturating_mul(self.max_files)
            .saturating_add(overhead)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_path: default_upload_path(),
            base_url: default_upload_url(),
            max_file_bytes: default_max_file_bytes(),
            max_files: default_max_files(),
        }
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Report submissions allowed per client address per hour.
    #[serde(default = "default_report_per_hour")]
    pub report_per_hour: u32,
    /// Login attempts allowed per window.
    #[serde(default = "default_login_max")]
    pub login_max: u32,
    /// Login window length in seconds.
    #[serde(default = "default_login_window")]
    pub login_window_secs: u64,
    /// Requests per minute for all other endpoints.
    #[serde(default = "default_standard_per_minute")]
    pub standard_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            report_per_hour: default_report_per_hour(),
            login_max: default_login_max(),
            login_window_secs: default_login_window(),
            standard_per_minute: default_standard_per_minute(),
        }
    }
}

/// Report lifecycle policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportPolicyConfig {
    /// Allow providers to move a resolved report back to "In Progress".
    #[serde(default)]
    pub allow_reopen: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON formatted logs.
    #[serde(default)]
    pub json: bool,
}

/// Administrator bootstrap configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Administrator username.
    pub admin_username: String,
    /// Administrator email.
    pub admin_email: String,
    /// Administrator password.
    pub admin_password: String,
    /// Reset the password of an existing administrator on startup.
    #[serde(default)]
    pub reset_password: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_session_ttl() -> i64 {
    12
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_upload_url() -> String {
    "/uploads".to_string()
}

const fn default_max_file_bytes() -> u64 {
    16 * 1024 * 1024
}

const fn default_max_files() -> usize {
    5
}

const fn default_report_per_hour() -> u32 {
    5
}

const fn default_login_max() -> u32 {
    10
}

const fn default_login_window() -> u64 {
    300
}

const fn default_standard_per_minute() -> u32 {
    300
}

/// Secret shipped in `config/default.toml`.
const PLACEHOLDER_SECRET: &str = "change-me";

fn invalid(message: &str) -> config::ConfigError {
    config::ConfigError::Message(message.to_string())
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `SAFENET_ENV`)
    /// 3. Environment variables with `SAFENET__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("SAFENET_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SAFENET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate(&env)?;
        Ok(config)
    }

    /// Reject settings the server cannot run safely with.
    ///
    /// The shipped placeholder secret is only accepted outside `production`.
    pub fn validate(&self, env: &str) -> Result<(), config::ConfigError> {
        let secret = self.security.ip_hash_secret.trim();
        if secret.is_empty() {
            return Err(invalid("security.ip_hash_secret must not be empty"));
        }
        if env == "production" && secret == PLACEHOLDER_SECRET {
            return Err(invalid(
                "security.ip_hash_secret must be changed from the default in production",
            ));
        }
        if self.security.session_ttl_hours <= 0 {
            return Err(invalid("security.session_ttl_hours must be positive"));
        }
        if self.uploads.max_files == 0 || self.uploads.max_file_bytes == 0 {
            return Err(invalid("uploads.max_files and uploads.max_file_bytes must be positive"));
        }
        if self.rate_limit.report_per_hour == 0
            || self.rate_limit.login_max == 0
            || self.rate_limit.standard_per_minute == 0
        {
            return Err(invalid("rate limits must allow at least one request"));
        }
        Ok(())
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SAFENET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
