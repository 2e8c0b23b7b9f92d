//! Gate health derived from configuration

use crate::config::{ConfigIssue, GateConfig};
use serde::Serialize;

/// Whether a gate can serve requests.
///
/// A degraded gate still accepts traffic but answers every well-formed
/// request with a configuration failure until it is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "issues", rename_all = "lowercase")]
pub enum GateHealth {
    /// All required settings are present
    Healthy,
    /// One or more required settings are missing
    Degraded(Vec<ConfigIssue>),
}

impl GateHealth {
    /// Evaluate a configuration
    pub fn from_config(config: &GateConfig) -> Self {
        let issues = config.issues();
        if issues.is_empty() {
            GateHealth::Healthy
        } else {
            GateHealth::Degraded(issues)
        }
    }

    /// True when no issues were found
    pub fn is_healthy(&self) -> bool {
        matches!(self, GateHealth::Healthy)
    }

    /// Issues behind a degraded state
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            GateHealth::Healthy => &[],
            GateHealth::Degraded(issues) => issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy() {
        let health = GateHealth::from_config(&GateConfig::new("http://idp/token", "api"));
        assert!(health.is_healthy());
        assert!(health.issues().is_empty());
    }

    #[test]
    fn test_degraded() {
        let health = GateHealth::from_config(&GateConfig::new("", "api"));
        assert!(!health.is_healthy());
        assert_eq!(health.issues(), &[ConfigIssue::MissingAuthServerUrl]);
    }

    #[test]
    fn test_serialization() {
        let health = GateHealth::Degraded(vec![ConfigIssue::MissingClientId]);
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["issues"][0], "missing_client_id");
    }
}
