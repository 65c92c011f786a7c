//! Prefix-based route table.
//!
//! Routes are matched by longest-registered-prefix semantics only in the
//! sense the operator controls: higher `priority` values are consulted
//! first, and within equal priority the registration order decides.  The
//! table is built once at startup and read concurrently afterwards, so
//! resolution is a plain scan over a small immutable vector.

use pylon_kernel::{GatewayError, RouteConfig, RouteMatch, Router};
use tracing::info;

/// Route table resolving request paths to upstream endpoints.
#[derive(Debug, Default)]
pub struct PrefixRouter {
    routes: Vec<RouteConfig>,
}

impl PrefixRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for PrefixRouter {
    fn register(&mut self, route: RouteConfig) -> Result<(), GatewayError> {
        if self.routes.iter().any(|r| r.id == route.id) {
            return Err(GatewayError::DuplicateRoute(route.id));
        }
        info!(
            route_id    = %route.id,
            path_prefix = %route.path_prefix,
            endpoint    = %route.uri,
            "route registered"
        );
        // Keep the vector sorted by descending priority; equal priorities
        // stay in registration order because we insert after them.
        let at = self
            .routes
            .partition_point(|r| r.priority >= route.priority);
        self.routes.insert(at, route);
        Ok(())
    }

    fn resolve(&self, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .find(|r| path.starts_with(r.path_prefix.as_str()))
            .map(|r| RouteMatch {
                route_id: r.id.clone(),
                uri: r.uri.clone(),
                timeout_ms: r.timeout_ms,
            })
    }

    fn routes(&self) -> Vec<&RouteConfig> {
        self.routes.iter().collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
