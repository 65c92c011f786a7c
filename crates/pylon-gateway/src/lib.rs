//! `pylon-gateway`: the Pylon API gateway runtime.
//!
//! This crate provides the concrete implementations of the gateway kernel
//! contracts defined in `pylon-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`pylon_kernel::Router`] | [`router::PrefixRouter`] |
//! | [`pylon_kernel::Forwarder`] | [`proxy::HttpForwarder`] |
//! | [`pylon_kernel::GatewayFilter`] | [`filter::ObservabilityFilter`], [`filter::JwtAuthFilter`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service: requests are resolved against the route table, pushed through
//! the filter chain (request logging outermost, then token verification) and
//! forwarded to the matched upstream.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pylon_gateway::server::GatewayServer;
//! use pylon_kernel::{AuthConfig, GatewayConfig, RouteConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::new("my-gateway")
//!         .with_route(RouteConfig::new(
//!             "account",
//!             "/api/account",
//!             "http://127.0.0.1:9001",
//!         ))
//!         .with_auth(
//!             AuthConfig::new(std::env::var("PYLON_AUTH__SECRET").unwrap_or_default())
//!                 .with_excluded_path("/actuator/health"),
//!         );
//!
//!     let server = GatewayServer::new(8080);
//!     server.start(config).await.unwrap();
//! }
//! ```

pub mod config;
pub mod filter;
pub mod proxy;
pub mod respond;
pub mod router;
pub mod server;
pub mod token;

// Re-export the kernel contracts for convenience.
pub use pylon_kernel as kernel;
