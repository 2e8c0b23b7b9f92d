//! UMA Gate HTTP Server - hosts the authorization gate in front of an upstream
//!
//! Requests that pass the gate are relayed unmodified to the configured
//! upstream; everything else is answered here with the gate's status code.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod tracing;

pub use api::{HealthResponse, HealthStatus};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
