//! Settings loading for the gateway binary.
//!
//! Sources layer in order: an optional config file (TOML, YAML or JSON,
//! detected from the extension), then `PYLON_*` environment variables.
//! Nesting uses double underscores, so `PYLON_AUTH__SECRET` overrides
//! `auth.secret` and `PYLON_PORT` overrides `port`.  Environment always
//! wins, which keeps secrets out of files in deployment.

use config::{Config, Environment, File};
use pylon_kernel::{AuthConfig, GatewayConfig, RouteConfig};
use serde::Deserialize;
use std::fmt;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "PYLON";

/// Deserialized settings tree, converted into a validated
/// [`GatewayConfig`] before the server starts.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Gateway instance id used in startup logs.
    #[serde(default = "default_id")]
    pub id: String,
    /// TCP port the gateway listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route table; lists are file-only, environment cannot express them.
    #[serde(default)]
    pub routes: Vec<RouteSettings>,
    /// Token verification settings.
    pub auth: AuthSettings,
    /// Default upstream timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// One proxied route.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSettings {
    pub id: String,
    pub path_prefix: String,
    pub uri: String,
    /// Per-route timeout override, `0` keeps the gateway default.
    #[serde(default)]
    pub timeout_ms: u64,
    /// Higher values are matched first.
    #[serde(default)]
    pub priority: i32,
}

/// Authentication settings.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC signing secret shared with the token issuer.
    pub secret: String,
    /// Path prefixes that bypass authentication.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

// The secret must never leak through Debug formatting of the settings
// tree, the same contract the kernel config upholds.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &format_args!("[{} bytes]", self.secret.len()))
            .field("excluded_paths", &self.excluded_paths)
            .finish()
    }
}

fn default_id() -> String {
    "pylon-gateway".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Settings {
    /// Load settings from an optional file plus `PYLON_*` environment
    /// overrides.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Convert into the kernel config consumed by the server.  Validation
    /// happens there, once, whatever the settings source was.
    pub fn into_gateway_config(self) -> GatewayConfig {
        let mut auth = AuthConfig::new(self.auth.secret);
        for prefix in self.auth.excluded_paths {
            auth = auth.with_excluded_path(prefix);
        }
        let mut config = GatewayConfig::new(self.id)
            .with_auth(auth)
            .with_timeout_ms(self.request_timeout_ms);
        for route in self.routes {
            config = config.with_route(
                RouteConfig::new(route.id, route.path_prefix, route.uri)
                    .with_timeout_ms(route.timeout_ms)
                    .with_priority(route.priority),
            );
        }
        config
    }
}

// =============================================================================
// Tests
// =============================================================================
