//! Relay of authorized requests to the upstream service

use crate::error::{ApiError, ApiResult};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    response::Response,
    Router,
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::sync::Arc;
use tracing::{debug, error};

const HOP_BY_HOP: [HeaderName; 5] = [
    header::CONNECTION,
    header::HOST,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::UPGRADE,
];

/// Target of relayed requests
#[derive(Debug, Clone)]
pub struct Upstream {
    base_url: String,
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Upstream {
    /// Relay to `base_url`; request paths are appended to it verbatim
    pub fn new(base_url: impl Into<String>, max_body_bytes: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            max_body_bytes,
        })
    }

    /// Router sending every request to [`forward`]
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(forward)
            .with_state(Arc::new(self))
    }
}

fn body_error(err: axum::Error, limit: usize) -> ApiError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return ApiError::PayloadTooLarge(limit);
        }
        source = cause.source();
    }
    ApiError::BadRequest(format!("Failed to read request body: {}", err))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Relay the request upstream and return its answer
pub async fn forward(State(upstream): State<Arc<Upstream>>, request: Request) -> ApiResult<Response> {
    // Same path and query, rebased onto the upstream
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", upstream.base_url, path_and_query);

    let body = to_bytes(body, upstream.max_body_bytes)
        .await
        .map_err(|e| body_error(e, upstream.max_body_bytes))?;

    // Everything else, Authorization included, is relayed as received
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    debug!(method = %parts.method, url = %url, "Relaying request upstream");
    let reply = upstream
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            error!(url = %url, error = %e, "Upstream request failed");
            ApiError::BadGateway(e.to_string())
        })?;

    // Relay the upstream answer unchanged
    let status = reply.status();
    let mut headers = reply.headers().clone();
    strip_hop_by_hop(&mut headers);
    let bytes = reply
        .bytes()
        .await
        .map_err(|e| ApiError::BadGateway(format!("Failed to read upstream body: {}", e)))?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let upstream = Upstream::new("http://backend:9000/", 1024).unwrap();
        assert_eq!(upstream.base_url, "http://backend:9000");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_before_relay() {
        // Nothing listens on the discard port; the body check fails first
        let router = Upstream::new("http://127.0.0.1:9", 8).unwrap().into_router();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/a/b/c/orders/write")
            .body(Body::from("0123456789abcdef"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "payload_too_large");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "gate".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert(header::AUTHORIZATION, "Bearer t".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::AUTHORIZATION], "Bearer t");
    }
}
