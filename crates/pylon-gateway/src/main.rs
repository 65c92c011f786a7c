//! Pylon gateway entry point.
//!
//! Loads settings from an optional config file plus `PYLON_*` environment
//! overrides and starts the axum-based HTTP gateway service.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PYLON_CONFIG` | *(none)* | Path to a TOML/YAML/JSON settings file. |
//! | `PYLON_ID` | `pylon-gateway` | Gateway instance id used in logs. |
//! | `PYLON_PORT` | `8080` | TCP port to listen on. |
//! | `PYLON_AUTH__SECRET` | *(required)* | HMAC secret shared with the token issuer, at least 32 bytes. |
//! | `PYLON_REQUEST_TIMEOUT_MS` | `30000` | Default upstream timeout in milliseconds. |
//!
//! Route definitions are lists and therefore file-only; see
//! [`pylon_gateway::config`] for the full settings tree.

use pylon_gateway::config::Settings;
use pylon_gateway::server::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pylon_gateway=info".parse().unwrap()),
        )
        .init();

    let config_path = std::env::var("PYLON_CONFIG").ok();
    let settings = match Settings::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load gateway settings: {e}");
            std::process::exit(1);
        }
    };

    info!(
        gateway_id     = %settings.id,
        port           = settings.port,
        routes         = settings.routes.len(),
        excluded_paths = settings.auth.excluded_paths.len(),
        "Pylon gateway configuration loaded"
    );

    let server = GatewayServer::from_settings(&settings);
    if let Err(e) = server.start(settings.into_gateway_config()).await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}
