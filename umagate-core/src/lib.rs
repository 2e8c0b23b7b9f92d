//! UMA Gate Core - per-request authorization against a UMA-ticket policy server
//!
//! The gate derives a `/<resource>#<scope>` permission from the request path,
//! asks the configured authorization server whether the caller's bearer
//! credential holds it, and reports the outcome. Hosting the gate in front of a
//! downstream handler is left to the embedding server.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod health;
pub mod permission;
pub mod policy;
pub mod request;

pub use config::{ConfigIssue, GateConfig};
pub use error::{ConfigError, GateError, Result};
pub use gate::{AuthorizationGate, GateBuilder};
pub use health::GateHealth;
pub use permission::{Permission, PermissionMapper, SegmentMapper, DEFAULT_PREFIX_DEPTH};
pub use policy::{
    PolicyDecision, PolicyDecisionPoint, PolicyQuery, PolicyResponse, UmaTicketClient,
    UMA_TICKET_GRANT_TYPE,
};
pub use request::{AccessRequest, Credential};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }
}
