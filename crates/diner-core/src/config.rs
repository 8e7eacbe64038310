//! Configuration management for the admin dashboard

use crate::types::Credentials;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix (`DINER__BACKEND__URL`, ...)
pub const ENV_PREFIX: &str = "DINER";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// External store connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Administrator credential used by the login action
    #[serde(default)]
    pub admin: AdminConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which external store implementation to talk to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Hosted Postgres REST + auth service
    #[default]
    Supabase,
    /// In-process store seeded with demo data
    Memory,
}

/// External store configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend implementation
    #[serde(default)]
    pub provider: BackendProvider,

    /// Project endpoint, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Public (anon) key
    #[serde(default)]
    pub anon_key: String,

    /// Per-request timeout in seconds; unset leaves the client default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Retries after a transport failure; 0 disables retrying
    #[serde(default)]
    pub max_retries: u32,

    /// Delay before the first retry, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Administrator credential configuration
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Login identifier sent to the identity provider
    #[serde(default)]
    pub email: String,

    /// Password sent to the identity provider
    #[serde(default)]
    pub password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::default(),
            url: String::new(),
            anon_key: String::new(),
            request_timeout_secs: None,
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminConfig {
    /// The credential the login action submits
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

impl Config {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `config.toml` (or any format the `config`
    /// crate recognizes under the name `config`) is read if present.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check the values that have no usable default
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(crate::Error::validation("server.port", "must not be 0"));
        }

        if self.backend.provider == BackendProvider::Supabase {
            if self.backend.url.trim().is_empty() {
                return Err(crate::Error::validation(
                    "backend.url",
                    "is required for the supabase provider",
                ));
            }
            if self.backend.anon_key.trim().is_empty() {
                return Err(crate::Error::validation(
                    "backend.anon_key",
                    "is required for the supabase provider",
                ));
            }
        }

        if self.admin.email.trim().is_empty() {
            return Err(crate::Error::validation("admin.email", "is required"));
        }

        Ok(())
    }
}
