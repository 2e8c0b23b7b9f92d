//! API response types

use serde::{Deserialize, Serialize};
use umagate_core::GateHealth;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: HealthStatus,

    /// Service version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: u64,

    /// Missing configuration, empty when healthy
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Gate is fully configured
    Healthy,
    /// Gate is running but will reject every request
    Degraded,
}

impl From<&GateHealth> for HealthStatus {
    fn from(health: &GateHealth) -> Self {
        if health.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}
