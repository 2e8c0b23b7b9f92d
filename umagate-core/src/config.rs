//! Gate configuration
//!
//! Configuration is read once, handed to [`crate::GateBuilder`] and never
//! mutated afterwards. It lives under a `[gate]` table so the same file can
//! carry settings for the hosting process.

use crate::error::ConfigError;
use crate::permission::DEFAULT_PREFIX_DEPTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`GateConfig::auth_server_url`]
pub const ENV_AUTH_SERVER_URL: &str = "UMAGATE_AUTH_SERVER_URL";
/// Environment variable overriding [`GateConfig::client_id`]
pub const ENV_CLIENT_ID: &str = "UMAGATE_CLIENT_ID";
/// Environment variable overriding [`GateConfig::timeout_ms`]
pub const ENV_TIMEOUT_MS: &str = "UMAGATE_TIMEOUT_MS";
/// Environment variable overriding [`GateConfig::insecure_skip_verify`]
pub const ENV_INSECURE_SKIP_VERIFY: &str = "UMAGATE_INSECURE_SKIP_VERIFY";
/// Environment variable overriding [`GateConfig::prefix_depth`]
pub const ENV_PREFIX_DEPTH: &str = "UMAGATE_PREFIX_DEPTH";

/// Settings for one authorization gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Token endpoint of the authorization server
    #[serde(alias = "keycloakURL", alias = "authServerURL")]
    pub auth_server_url: String,

    /// Client identifier sent as the `audience` of every policy query
    #[serde(alias = "keycloakClientId", alias = "clientID")]
    pub client_id: String,

    /// Upper bound on a single policy query, in milliseconds
    pub timeout_ms: u64,

    /// Accept any TLS certificate from the authorization server
    pub insecure_skip_verify: bool,

    /// Path segments preceding `<resource>/<scope>`
    pub prefix_depth: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            auth_server_url: String::new(),
            client_id: String::new(),
            timeout_ms: 10_000,
            insecure_skip_verify: false,
            prefix_depth: DEFAULT_PREFIX_DEPTH,
        }
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    gate: GateConfig,
}

impl GateConfig {
    /// Create a configuration with default timeout, TLS and path settings
    pub fn new(auth_server_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        GateConfig {
            auth_server_url: auth_server_url.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Timeout for a single policy query
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse the `[gate]` table of a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(contents)?;
        Ok(document.gate)
    }

    /// Read and parse a TOML configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `UMAGATE_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_AUTH_SERVER_URL) {
            self.auth_server_url = url;
        }
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = parse_override(ENV_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_INSECURE_SKIP_VERIFY) {
            self.insecure_skip_verify = parse_override(ENV_INSECURE_SKIP_VERIFY, value)?;
        }
        if let Some(value) = lookup(ENV_PREFIX_DEPTH) {
            self.prefix_depth = parse_override(ENV_PREFIX_DEPTH, value)?;
        }
        Ok(())
    }

    /// Required settings that are empty or whitespace-only
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.auth_server_url.trim().is_empty() {
            issues.push(ConfigIssue::MissingAuthServerUrl);
        }
        if self.client_id.trim().is_empty() {
            issues.push(ConfigIssue::MissingClientId);
        }
        issues
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            key: key.to_string(),
            value,
        })
}

/// A required setting that is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigIssue {
    /// `auth_server_url` is empty
    MissingAuthServerUrl,
    /// `client_id` is empty
    MissingClientId,
}

impl ConfigIssue {
    /// Name of the configuration field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigIssue::MissingAuthServerUrl => "auth_server_url",
            ConfigIssue::MissingClientId => "client_id",
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is empty", self.field())
    }
}
