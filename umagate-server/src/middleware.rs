//! Gate middleware
//!
//! Wraps any axum router: authorized requests reach it untouched, rejected
//! requests never do.

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::borrow::Cow;
use std::time::Instant;
use tracing::debug;
use umagate_core::AccessRequest;

/// Percent-decode `path`; undecodable paths are used as received
fn decoded_path(path: &str) -> Cow<'_, str> {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(path = %path, error = %e, "Path is not valid UTF-8 once decoded; using raw path");
            Cow::Borrowed(path)
        }
    }
}

/// Run the gate, then either forward the original request or reject it
pub async fn authorize_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let path = decoded_path(request.uri().path()).into_owned();
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.as_bytes().to_vec());

    let access = AccessRequest::new(&path).with_authorization_bytes(authorization.as_deref());
    let outcome = state.gate.authorize(&access).await;
    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        Ok(_) => {
            metrics::record_granted(elapsed);
            next.run(request).await
        }
        Err(e) => {
            metrics::record_rejected(&e, elapsed);
            ApiError::from(e).into_response()
        }
    }
}
