//! Request path to permission mapping

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path segments preceding `<resource>/<scope>` unless configured otherwise
pub const DEFAULT_PREFIX_DEPTH: usize = 3;

/// A resource/scope pair checked against the authorization server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Protected entity
    pub resource: String,
    /// Action on the entity
    pub scope: String,
}

impl Permission {
    /// Create a permission
    pub fn new(resource: impl Into<String>, scope: impl Into<String>) -> Self {
        Permission {
            resource: resource.into(),
            scope: scope.into(),
        }
    }
}

/// Renders the UMA form `/<resource>#<scope>`
impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}#{}", self.resource, self.scope)
    }
}

/// Strategy turning a request path into the permission to check
pub trait PermissionMapper: Send + Sync {
    /// Derive the permission, or fail with [`GateError::InvalidPathFormat`]
    fn map(&self, path: &str) -> Result<Permission>;
}

impl<F> PermissionMapper for F
where
    F: Fn(&str) -> Result<Permission> + Send + Sync,
{
    fn map(&self, path: &str) -> Result<Permission> {
        self(path)
    }
}

/// Takes resource and scope from fixed positions after a prefix.
///
/// With the default depth of 3, `/p1/p2/p3/<resource>/<scope>/...` splits
/// on `/` into at least six parts. Anything after the scope is ignored and
/// empty segments are taken as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMapper {
    prefix_depth: usize,
}

impl SegmentMapper {
    /// Create a mapper skipping `prefix_depth` leading segments
    pub fn new(prefix_depth: usize) -> Self {
        SegmentMapper { prefix_depth }
    }

    /// Number of leading segments skipped
    pub fn prefix_depth(&self) -> usize {
        self.prefix_depth
    }

    /// Minimum number of `/`-separated parts a path must split into
    pub fn min_segments(&self) -> usize {
        self.prefix_depth + 3
    }
}

impl Default for SegmentMapper {
    fn default() -> Self {
        SegmentMapper::new(DEFAULT_PREFIX_DEPTH)
    }
}

impl PermissionMapper for SegmentMapper {
    fn map(&self, path: &str) -> Result<Permission> {
        // +1 for the empty part in front of the leading slash
        let mut parts = path.split('/').skip(self.prefix_depth + 1);
        match (parts.next(), parts.next()) {
            (Some(resource), Some(scope)) => Ok(Permission::new(resource, scope)),
            _ => Err(GateError::InvalidPathFormat {
                path: path.to_string(),
            }),
        }
    }
}
