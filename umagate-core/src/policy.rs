//! Policy queries against a UMA-ticket authorization server

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::permission::Permission;
use crate::request::Credential;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

/// Grant type of the UMA ticket token exchange
pub const UMA_TICKET_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";

/// Form payload asking whether the caller holds one permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyQuery {
    /// Permission in `/<resource>#<scope>` form
    pub permission: String,
    /// Always [`UMA_TICKET_GRANT_TYPE`]
    pub grant_type: &'static str,
    /// Client the permission is requested for
    pub audience: String,
}

impl PolicyQuery {
    /// Build the query for `permission` on behalf of `audience`
    pub fn new(permission: &Permission, audience: impl Into<String>) -> Self {
        PolicyQuery {
            permission: permission.to_string(),
            grant_type: UMA_TICKET_GRANT_TYPE,
            audience: audience.into(),
        }
    }

    /// Form fields in wire order
    pub fn form(&self) -> [(&'static str, &str); 3] {
        [
            ("permission", self.permission.as_str()),
            ("grant_type", self.grant_type),
            ("audience", self.audience.as_str()),
        ]
    }
}

/// Raw answer of the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, kept for diagnostics only
    pub body: String,
}

/// Outcome of a policy query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The caller holds the permission
    Granted,
    /// Anything other than a 200 answer
    Denied {
        /// Status code returned by the authorization server
        status: u16,
    },
}

impl PolicyDecision {
    /// Only 200 grants access
    pub fn from_status(status: u16) -> Self {
        if status == 200 {
            PolicyDecision::Granted
        } else {
            PolicyDecision::Denied { status }
        }
    }

    /// Check if the decision grants access
    pub fn is_granted(&self) -> bool {
        matches!(self, PolicyDecision::Granted)
    }
}

impl From<&PolicyResponse> for PolicyDecision {
    fn from(response: &PolicyResponse) -> Self {
        PolicyDecision::from_status(response.status)
    }
}

/// The external service deciding whether a credential holds a permission
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    /// Send `query` to `endpoint` on behalf of `credential`.
    ///
    /// Any failure to obtain a status code is a
    /// [`GateError::UpstreamRequest`]; non-200 answers are returned as
    /// responses, not errors.
    async fn evaluate(
        &self,
        endpoint: &str,
        credential: &Credential,
        query: &PolicyQuery,
    ) -> Result<PolicyResponse>;
}

/// HTTP client posting UMA ticket requests to a token endpoint
#[derive(Debug, Clone)]
pub struct UmaTicketClient {
    client: reqwest::Client,
}

impl UmaTicketClient {
    /// Build a client honouring the configured timeout and TLS settings
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| GateError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: reqwest::Client) -> Self {
        UmaTicketClient { client }
    }
}

#[async_trait]
impl PolicyDecisionPoint for UmaTicketClient {
    async fn evaluate(
        &self,
        endpoint: &str,
        credential: &Credential,
        query: &PolicyQuery,
    ) -> Result<PolicyResponse> {
        let authorization = HeaderValue::from_bytes(credential.as_bytes()).map_err(|e| {
            GateError::UpstreamRequest(format!("Invalid Authorization header value: {}", e))
        })?;

        let response = self
            .client
            .post(endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&query.form())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(endpoint = %endpoint, "Policy query timed out");
                }
                GateError::UpstreamRequest(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Failed to read policy response body");
                String::new()
            }
        };

        Ok(PolicyResponse { status, body })
    }
}
