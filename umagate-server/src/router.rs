//! Application router

use crate::handlers;
use crate::middleware::authorize_middleware;
use crate::state::AppState;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Put `downstream` behind the gate and add the operational routes.
///
/// `/health/live`, `/health/ready` and `/metrics` are answered without
/// authorization; every other request goes through the gate first.
pub fn build(state: AppState, downstream: Router) -> Router {
    let gated = downstream.layer(from_fn_with_state(state.clone(), authorize_middleware));

    Router::new()
        .route("/health/live", get(handlers::health_live))
        .route("/health/ready", get(handlers::health_ready))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .merge(gated)
        .layer(TraceLayer::new_for_http())
}
