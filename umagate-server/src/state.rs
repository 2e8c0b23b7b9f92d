//! Application state

use std::sync::Arc;
use std::time::Instant;
use umagate_core::AuthorizationGate;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The authorization gate
    pub gate: Arc<AuthorizationGate>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(gate: AuthorizationGate) -> Self {
        Self {
            gate: Arc::new(gate),
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
