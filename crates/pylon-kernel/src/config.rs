//! Gateway configuration container and startup validation.
//!
//! [`GatewayConfig`] aggregates the configuration dimensions (routes,
//! authentication policy, global settings) and exposes a single
//! [`validate()`](GatewayConfig::validate) method that checks all structural
//! invariants *before* any runtime resources are allocated.

use crate::error::GatewayError;
use crate::router::RouteConfig;
use std::collections::HashSet;
use std::fmt;

/// Minimum secret length for HMAC-SHA256 token verification (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// AuthConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication policy: the token-verification secret and the ordered
/// list of path prefixes that bypass authentication.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret.  Must be at least
    /// [`MIN_SECRET_BYTES`] bytes; never logged.
    pub secret: String,
    /// Path prefixes that skip token verification, tested in list order.
    /// Each entry must start with `/`.
    pub excluded_paths: Vec<String>,
}

impl AuthConfig {
    /// Create a policy with the given secret and no excluded paths.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            excluded_paths: Vec::new(),
        }
    }

    /// Builder: append an excluded path prefix.
    pub fn with_excluded_path(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_paths.push(prefix.into());
        self
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.secret.len() < MIN_SECRET_BYTES {
            return Err(GatewayError::SecretTooShort(self.secret.len()));
        }
        for prefix in &self.excluded_paths {
            if !prefix.starts_with('/') {
                return Err(GatewayError::InvalidExcludedPath(prefix.clone()));
            }
        }
        Ok(())
    }
}

// The secret must never appear in logs or panic payloads, so Debug renders
// only its length.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &format_args!("[{} bytes]", self.secret.len()))
            .field("excluded_paths", &self.excluded_paths)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level gateway configuration.
///
/// Call [`validate()`](Self::validate) to check all structural invariants
/// before passing this config to the gateway runtime.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Unique identifier for this gateway instance.
    pub id: String,
    /// All route definitions.
    pub routes: Vec<RouteConfig>,
    /// Authentication policy.
    pub auth: AuthConfig,
    /// Global default request timeout in milliseconds (must be > 0).
    pub request_timeout_ms: u64,
}

impl GatewayConfig {
    /// Construct a minimal config with only a gateway id.  The auth secret
    /// starts empty and must be set before validation can pass.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            routes: Vec::new(),
            auth: AuthConfig::new(""),
            request_timeout_ms: 30_000,
        }
    }

    /// Builder: add a route.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Builder: set the authentication policy.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Builder: set the global request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns `Ok(())` if the configuration is structurally sound and can
    /// be used to initialise the gateway runtime.  Returns the *first*
    /// detected [`GatewayError`] otherwise.
    ///
    /// Checks performed (in order):
    /// 1. Gateway id is non-empty.
    /// 2. At least one route is defined.
    /// 3. Global `request_timeout_ms` is non-zero.
    /// 4. Each route passes its own [`RouteConfig::validate()`] check.
    /// 5. No two routes share the same id.
    /// 6. The auth secret is at least [`MIN_SECRET_BYTES`] bytes.
    /// 7. Every excluded path starts with `/`.
    pub fn validate(&self) -> Result<(), GatewayError> {
        // ── 1. Gateway id ────────────────────────────────────────────────────
        if self.id.trim().is_empty() {
            return Err(GatewayError::EmptyGatewayId);
        }

        // ── 2. At least one route ────────────────────────────────────────────
        if self.routes.is_empty() {
            return Err(GatewayError::NoRoutes);
        }

        // ── 3. Global timeout is non-zero ────────────────────────────────────
        if self.request_timeout_ms == 0 {
            return Err(GatewayError::InvalidTimeout);
        }

        // ── 4 + 5. Validate each route, check for duplicates ─────────────────
        let mut route_ids: HashSet<&str> = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !route_ids.insert(route.id.as_str()) {
                return Err(GatewayError::DuplicateRoute(route.id.clone()));
            }
        }

        // ── 6 + 7. Auth policy ───────────────────────────────────────────────
        self.auth.validate()?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef"; // 32 bytes

    fn account_route() -> RouteConfig {
        RouteConfig::new("account", "/api/account", "http://account-service:8080")
    }

    fn valid_config() -> GatewayConfig {
        GatewayConfig::new("gateway-test")
            .with_route(account_route())
            .with_auth(AuthConfig::new(TEST_SECRET))
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn valid_config_with_excluded_paths_passes() {
        let auth = AuthConfig::new(TEST_SECRET)
            .with_excluded_path("/actuator/health")
            .with_excluded_path("/api/linebot/webhook");
        let cfg = valid_config().with_auth(auth);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn multiple_routes_pass() {
        let cfg = valid_config()
            .with_route(RouteConfig::new("linebot", "/api/linebot", "http://linebot-service:8080"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn secret_of_exactly_32_bytes_passes() {
        let cfg = valid_config().with_auth(AuthConfig::new("x".repeat(32)));
        assert!(cfg.validate().is_ok());
    }

    // ── Identity errors ───────────────────────────────────────────────────────

    #[test]
    fn empty_gateway_id_returns_error() {
        let cfg = GatewayConfig::new("")
            .with_route(account_route())
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert_eq!(cfg.validate(), Err(GatewayError::EmptyGatewayId));
    }

    #[test]
    fn whitespace_only_gateway_id_returns_error() {
        let cfg = GatewayConfig::new("   ")
            .with_route(account_route())
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert_eq!(cfg.validate(), Err(GatewayError::EmptyGatewayId));
    }

    // ── Route errors ──────────────────────────────────────────────────────────

    #[test]
    fn no_routes_returns_error() {
        let cfg = GatewayConfig::new("gw").with_auth(AuthConfig::new(TEST_SECRET));
        assert_eq!(cfg.validate(), Err(GatewayError::NoRoutes));
    }

    #[test]
    fn duplicate_route_id_returns_error() {
        let cfg = valid_config().with_route(account_route()); // same id again
        assert_eq!(
            cfg.validate(),
            Err(GatewayError::DuplicateRoute("account".to_string()))
        );
    }

    #[test]
    fn route_with_empty_id_returns_error() {
        let bad = RouteConfig::new("", "/api/account", "http://account-service:8080");
        let cfg = GatewayConfig::new("gw")
            .with_route(bad)
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert_eq!(cfg.validate(), Err(GatewayError::EmptyRouteId));
    }

    #[test]
    fn route_prefix_missing_leading_slash_returns_error() {
        let bad = RouteConfig::new("account", "api/account", "http://account-service:8080");
        let cfg = GatewayConfig::new("gw")
            .with_route(bad)
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::InvalidPathPrefix(ref id, _)) if id == "account"
        ));
    }

    #[test]
    fn route_uri_without_http_scheme_returns_error() {
        let bad = RouteConfig::new("account", "/api/account", "ftp://account-service");
        let cfg = GatewayConfig::new("gw")
            .with_route(bad)
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::InvalidEndpoint(ref id, _)) if id == "account"
        ));
    }

    #[test]
    fn route_uri_empty_returns_error() {
        let bad = RouteConfig::new("account", "/api/account", "");
        let cfg = GatewayConfig::new("gw")
            .with_route(bad)
            .with_auth(AuthConfig::new(TEST_SECRET));
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::InvalidEndpoint(ref id, _)) if id == "account"
        ));
    }

    // ── Timeout errors ────────────────────────────────────────────────────────

    #[test]
    fn zero_request_timeout_returns_error() {
        let cfg = valid_config().with_timeout_ms(0);
        assert_eq!(cfg.validate(), Err(GatewayError::InvalidTimeout));
    }

    // ── Auth errors ───────────────────────────────────────────────────────────

    #[test]
    fn secret_of_31_bytes_returns_error() {
        let cfg = valid_config().with_auth(AuthConfig::new("x".repeat(31)));
        assert_eq!(cfg.validate(), Err(GatewayError::SecretTooShort(31)));
    }

    #[test]
    fn empty_secret_returns_error() {
        let cfg = valid_config().with_auth(AuthConfig::new(""));
        assert_eq!(cfg.validate(), Err(GatewayError::SecretTooShort(0)));
    }

    #[test]
    fn excluded_path_missing_leading_slash_returns_error() {
        let auth = AuthConfig::new(TEST_SECRET).with_excluded_path("actuator/health");
        let cfg = valid_config().with_auth(auth);
        assert_eq!(
            cfg.validate(),
            Err(GatewayError::InvalidExcludedPath("actuator/health".to_string()))
        );
    }

    #[test]
    fn auth_debug_never_prints_the_secret() {
        let auth = AuthConfig::new(TEST_SECRET);
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains(TEST_SECRET));
        assert!(rendered.contains("[32 bytes]"));
    }
}
