//! Inbound request view used by the gate

use crate::error::{GateError, Result};
use std::fmt;

/// Opaque bearer credential copied from the `Authorization` header.
///
/// Held as raw bytes so header values carrying obs-text are forwarded to the
/// authorization server exactly as received.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Vec<u8>);

impl Credential {
    /// Wrap a raw header value
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Credential(value.into())
    }

    /// The header value exactly as received
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The header value as text, when it is valid UTF-8
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The parts of an inbound request the gate looks at
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest<'a> {
    /// Request path, percent-decoded, without query string
    pub path: &'a str,
    /// Raw `Authorization` header value, if any
    pub authorization: Option<&'a [u8]>,
}

impl fmt::Debug for AccessRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRequest")
            .field("path", &self.path)
            .field("authorization", &self.authorization.map(|_| "<redacted>"))
            .finish()
    }
}

impl<'a> AccessRequest<'a> {
    /// Request for `path` with no credential
    pub fn new(path: &'a str) -> Self {
        AccessRequest {
            path,
            authorization: None,
        }
    }

    /// Attach the `Authorization` header value
    pub fn with_authorization(self, authorization: Option<&'a str>) -> Self {
        self.with_authorization_bytes(authorization.map(str::as_bytes))
    }

    /// Attach the `Authorization` header value as raw bytes
    pub fn with_authorization_bytes(mut self, authorization: Option<&'a [u8]>) -> Self {
        self.authorization = authorization;
        self
    }

    /// Extract the credential; absent or blank headers are rejected
    pub fn credential(&self) -> Result<Credential> {
        match self.authorization {
            Some(value) if !value.iter().all(u8::is_ascii_whitespace) => {
                Ok(Credential::new(value))
            }
            _ => Err(GateError::MissingCredential),
        }
    }
}
