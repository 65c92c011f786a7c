//! Gateway router trait and route configuration types.
//!
//! The [`Router`] trait is the single kernel-level abstraction for request
//! routing.  Implementations (e.g. the prefix router in `pylon-gateway`)
//! are loaded with routes at startup and looked up on every inbound
//! request.  There is no runtime route management: the table is immutable
//! once the server is serving.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Route configuration
// ─────────────────────────────────────────────────────────────────────────────

/// A single routing rule mapping a path prefix to a backend base URI.
///
/// A request path matches when it starts with `path_prefix`; the full
/// original path (plus query) is appended to `uri` when forwarding:
/// ```text
/// prefix /api/account   uri http://account-service:8080
///   GET /api/account/profile  ──►  http://account-service:8080/api/account/profile
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Unique stable identifier for this route.
    pub id: String,
    /// Path prefix.  Must begin with `/`.
    pub path_prefix: String,
    /// Backend base URI.  Must use the `http` or `https` scheme.
    pub uri: String,
    /// Per-route request timeout in milliseconds (overrides the gateway
    /// default).  A value of `0` means "use the gateway default".
    #[serde(default)]
    pub timeout_ms: u64,
    /// Routing priority: higher values are evaluated first when multiple
    /// prefixes match the same path.
    #[serde(default)]
    pub priority: i32,
}

impl RouteConfig {
    /// Create a minimal route with just id, path prefix, and backend URI.
    pub fn new(id: impl Into<String>, path_prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path_prefix: path_prefix.into(),
            uri: uri.into(),
            timeout_ms: 0,
            priority: 0,
        }
    }

    /// Builder: set a per-route timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Builder: set routing priority (higher = evaluated first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Basic sanity checks run during [`GatewayConfig::validate()`].
    ///
    /// [`GatewayConfig::validate()`]: crate::config::GatewayConfig::validate
    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.id.trim().is_empty() {
            return Err(GatewayError::EmptyRouteId);
        }
        if !self.path_prefix.starts_with('/') {
            return Err(GatewayError::InvalidPathPrefix(
                self.id.clone(),
                "path prefix must start with '/'".to_string(),
            ));
        }
        if !(self.uri.starts_with("http://") || self.uri.starts_with("https://")) {
            return Err(GatewayError::InvalidEndpoint(
                self.id.clone(),
                "backend uri must use the http or https scheme".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route match
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a successful route lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteMatch {
    /// Id of the matched route.
    pub route_id: String,
    /// Backend base URI this route forwards to.
    pub uri: String,
    /// Effective timeout for this route in milliseconds (`0` = gateway
    /// default).
    pub timeout_ms: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for request routing.
///
/// Implementations receive [`RouteConfig`] entries at startup (via
/// [`register`](Router::register)) and resolve incoming paths to a
/// [`RouteMatch`] at request time.
///
/// The trait is intentionally synchronous: route lookup is a scan over an
/// in-memory table, no I/O on the hot path.
pub trait Router: Send + Sync {
    /// Register a new route.  Returns [`GatewayError::DuplicateRoute`] if a
    /// route with the same `id` is already registered.
    fn register(&mut self, route: RouteConfig) -> Result<(), GatewayError>;

    /// Resolve a request path to the best matching route.  Returns `None`
    /// when no route matches.
    fn resolve(&self, path: &str) -> Option<RouteMatch>;

    /// Return a snapshot of all registered routes, sorted by descending
    /// priority.
    fn routes(&self) -> Vec<&RouteConfig>;
}
