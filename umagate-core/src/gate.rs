//! The authorization gate
//!
//! One request flows through five steps, each of which either hands over to
//! the next or ends the request with a [`GateError`]:
//!
//! 1. credential extraction
//! 2. permission derivation
//! 3. configuration guard
//! 4. policy query
//! 5. decision interpretation
//!
//! Nothing is retained between requests apart from the immutable
//! configuration, so one gate can be shared by any number of concurrent
//! handlers.

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::health::GateHealth;
use crate::permission::{Permission, PermissionMapper, SegmentMapper};
use crate::policy::{PolicyDecision, PolicyDecisionPoint, PolicyQuery, UmaTicketClient};
use crate::request::AccessRequest;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, instrument, warn, Dispatch};

/// Assembles an [`AuthorizationGate`]
#[derive(Default)]
pub struct GateBuilder {
    config: Option<GateConfig>,
    mapper: Option<Arc<dyn PermissionMapper>>,
    policy: Option<Arc<dyn PolicyDecisionPoint>>,
    dispatch: Option<Dispatch>,
}

impl GateBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration (required)
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default [`SegmentMapper`]
    pub fn mapper(mut self, mapper: impl PermissionMapper + 'static) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Replace the default [`UmaTicketClient`]
    pub fn policy_decision_point(mut self, policy: impl PolicyDecisionPoint + 'static) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Route every log record of the gate to `dispatch` instead of the
    /// global subscriber
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Build the gate.
    ///
    /// Fails only when no configuration was supplied or the HTTP client
    /// cannot be created. Empty required settings produce a degraded gate.
    pub fn build(self) -> Result<AuthorizationGate> {
        let dispatch = self.dispatch;

        let Some(config) = self.config else {
            with_dispatch(dispatch.as_ref(), || {
                error!("No configuration provided; authorization gate cannot be built");
            });
            return Err(GateError::Configuration(
                "no configuration provided".to_string(),
            ));
        };

        let health = GateHealth::from_config(&config);
        with_dispatch(dispatch.as_ref(), || {
            for issue in health.issues() {
                warn!(
                    field = issue.field(),
                    "Gate configuration incomplete: {}; requests will fail until corrected",
                    issue
                );
            }
            if config.insecure_skip_verify {
                warn!("TLS certificate verification is disabled for the authorization server");
            }
            info!(
                auth_server_url = %config.auth_server_url,
                client_id = %config.client_id,
                prefix_depth = config.prefix_depth,
                timeout_ms = config.timeout_ms,
                healthy = health.is_healthy(),
                "Authorization gate initialized"
            );
        });

        let mapper = match self.mapper {
            Some(mapper) => mapper,
            None => Arc::new(SegmentMapper::new(config.prefix_depth)),
        };
        let policy: Arc<dyn PolicyDecisionPoint> = match self.policy {
            Some(policy) => policy,
            None => Arc::new(UmaTicketClient::from_config(&config)?),
        };

        Ok(AuthorizationGate {
            config: Arc::new(config),
            health: Arc::new(health),
            mapper,
            policy,
            dispatch,
        })
    }
}

/// Decides per request whether the downstream handler may run
#[derive(Clone)]
pub struct AuthorizationGate {
    config: Arc<GateConfig>,
    health: Arc<GateHealth>,
    mapper: Arc<dyn PermissionMapper>,
    policy: Arc<dyn PolicyDecisionPoint>,
    dispatch: Option<Dispatch>,
}

impl AuthorizationGate {
    /// Create a gate with the default mapper and policy client
    pub fn new(config: GateConfig) -> Result<Self> {
        GateBuilder::new().config(config).build()
    }

    /// Start a builder
    pub fn builder() -> GateBuilder {
        GateBuilder::new()
    }

    /// Configuration the gate was built with
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Health computed at construction
    pub fn health(&self) -> &GateHealth {
        &self.health
    }

    /// Decide whether `request` may be forwarded.
    ///
    /// `Ok` carries the permission that was granted; the caller forwards the
    /// original request untouched. Every `Err` ends the request with
    /// [`GateError::status_code`].
    pub async fn authorize(&self, request: &AccessRequest<'_>) -> Result<Permission> {
        let evaluation = self.evaluate(request);
        match &self.dispatch {
            Some(dispatch) => evaluation.with_subscriber(dispatch.clone()).await,
            None => evaluation.await,
        }
    }

    #[instrument(name = "gate_authorize", skip_all, fields(path = %request.path))]
    async fn evaluate(&self, request: &AccessRequest<'_>) -> Result<Permission> {
        let outcome = self.run(request).await;
        match &outcome {
            Ok(permission) => info!(permission = %permission, "Access granted"),
            Err(e) => warn!(
                kind = e.kind(),
                status = e.status_code(),
                error = %e,
                "Access rejected"
            ),
        }
        outcome
    }

    async fn run(&self, request: &AccessRequest<'_>) -> Result<Permission> {
        debug!(
            present = request.authorization.is_some(),
            "Inspecting Authorization header"
        );
        let credential = request.credential()?;

        let permission = self.mapper.map(request.path)?;
        debug!(permission = %permission, "Derived permission");

        let endpoint = self.config.auth_server_url.as_str();
        if endpoint.trim().is_empty() {
            error!("Authorization server URL is empty; cannot evaluate request");
            return Err(GateError::Misconfigured);
        }

        let query = PolicyQuery::new(&permission, self.config.client_id.as_str());
        debug!(endpoint = %endpoint, "Sending policy query");

        let start = Instant::now();
        let response = self.policy.evaluate(endpoint, &credential, &query).await?;
        debug!(
            status = response.status,
            body = %response.body,
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Policy response received"
        );

        match PolicyDecision::from(&response) {
            PolicyDecision::Granted => Ok(permission),
            PolicyDecision::Denied { status } => Err(GateError::AccessDenied { status }),
        }
    }
}

fn with_dispatch<T>(dispatch: Option<&Dispatch>, f: impl FnOnce() -> T) -> T {
    match dispatch {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}
