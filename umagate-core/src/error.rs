//! Error types for the authorization gate

use thiserror::Error;

/// Errors raised while building or running the gate.
///
/// Every request-scoped variant maps to exactly one HTTP status through
/// [`GateError::status_code`]. Transport failures and explicit denials share
/// the 401 status on the wire; [`GateError::kind`] keeps them apart in logs
/// and metrics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The gate cannot be constructed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The inbound request carried no usable Authorization header
    #[error("Missing Authorization header")]
    MissingCredential,

    /// The request path is too short to contain a resource and a scope
    #[error("Invalid path format. Expected format: /prefix/.../<resource>/<scope>")]
    InvalidPathFormat {
        /// The rejected path
        path: String,
    },

    /// No authorization server endpoint is configured
    #[error("Misconfigured authorization server")]
    Misconfigured,

    /// The policy query could not be built, sent or answered
    #[error("{0}")]
    UpstreamRequest(String),

    /// The authorization server refused the permission
    #[error("Unauthorized")]
    AccessDenied {
        /// Status code returned by the authorization server
        status: u16,
    },
}

impl GateError {
    /// HTTP status surfaced to the caller for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::Configuration(_) => 500,
            GateError::MissingCredential => 401,
            GateError::InvalidPathFormat { .. } => 400,
            GateError::Misconfigured => 500,
            GateError::UpstreamRequest(_) => 401,
            GateError::AccessDenied { .. } => 401,
        }
    }

    /// Stable machine-readable name, used as a log field and metric label
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::Configuration(_) => "configuration",
            GateError::MissingCredential => "missing_credential",
            GateError::InvalidPathFormat { .. } => "invalid_path_format",
            GateError::Misconfigured => "misconfigured",
            GateError::UpstreamRequest(_) => "upstream_request",
            GateError::AccessDenied { .. } => "access_denied",
        }
    }
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed
    #[error("Invalid value {value:?} for {key}")]
    InvalidOverride {
        /// Environment variable name
        key: String,
        /// Rejected value
        value: String,
    },
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GateError::MissingCredential.status_code(), 401);
        assert_eq!(
            GateError::InvalidPathFormat {
                path: "/a".to_string()
            }
            .status_code(),
            400
        );
        assert_eq!(GateError::Misconfigured.status_code(), 500);
        assert_eq!(
            GateError::UpstreamRequest("connection refused".to_string()).status_code(),
            401
        );
        assert_eq!(GateError::AccessDenied { status: 403 }.status_code(), 401);
        assert_eq!(
            GateError::Configuration("missing".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn test_transport_failure_and_denial_are_distinct_kinds() {
        let transport = GateError::UpstreamRequest("timed out".to_string());
        let denial = GateError::AccessDenied { status: 403 };

        assert_eq!(transport.status_code(), denial.status_code());
        assert_ne!(transport.kind(), denial.kind());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            GateError::MissingCredential.to_string(),
            "Missing Authorization header"
        );
        assert_eq!(
            GateError::InvalidPathFormat {
                path: "/x".to_string()
            }
            .to_string(),
            "Invalid path format. Expected format: /prefix/.../<resource>/<scope>"
        );
        assert_eq!(
            GateError::Misconfigured.to_string(),
            "Misconfigured authorization server"
        );
        assert_eq!(
            GateError::UpstreamRequest("connection refused".to_string()).to_string(),
            "connection refused"
        );
        assert_eq!(
            GateError::AccessDenied { status: 403 }.to_string(),
            "Unauthorized"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidOverride {
            key: "UMAGATE_TIMEOUT_MS".to_string(),
            value: "soon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"soon\" for UMAGATE_TIMEOUT_MS"
        );
    }
}
