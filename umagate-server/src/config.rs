//! Server configuration: the `[gate]` table plus hosting settings

use serde::{Deserialize, Serialize};
use std::path::Path;
use umagate_core::{ConfigError, GateConfig};

/// Environment variable overriding [`ServerSettings::bind_address`]
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";
/// Environment variable overriding [`ServerSettings::upstream_url`]
pub const ENV_UPSTREAM_URL: &str = "UMAGATE_UPSTREAM_URL";

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Gate settings
    pub gate: GateConfig,
    /// Hosting settings
    pub server: ServerSettings,
}

/// Listener and upstream settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on
    pub bind_address: String,
    /// Base URL requests are relayed to once authorized
    pub upstream_url: Option<String>,
    /// Largest request body relayed upstream
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            upstream_url: None,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from `path` when it exists, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides for both tables from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.gate.apply_overrides(&lookup)?;
        if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup(ENV_UPSTREAM_URL) {
            self.server.upstream_url = Some(url);
        }
        Ok(())
    }
}
