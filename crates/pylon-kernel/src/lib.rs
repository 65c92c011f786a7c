//! Kernel contract for the Pylon edge gateway.
//!
//! This crate defines the *trait interfaces and configuration types* for
//! the gateway pipeline.  No concrete implementations live here; those
//! belong in `pylon-gateway` (runtime).
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              pylon-kernel  (this crate)                     │
//! │  GatewayFilter trait + Next     Forwarder trait             │
//! │  Router trait                   GatewayConfig + validate()  │
//! │  Exchange / GatewayRequest / GatewayResponse / AuthDecision │
//! │  GatewayError                                               │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              pylon-gateway  (runtime crate)                 │
//! │  ObservabilityFilter / JwtAuthFilter                        │
//! │  PrefixRouter: impl Router                                  │
//! │  HttpForwarder: impl Forwarder  (reqwest proxy)             │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pylon_kernel::{AuthConfig, GatewayConfig, RouteConfig};
//!
//! let config = GatewayConfig::new("pylon-gateway")
//!     .with_route(RouteConfig::new(
//!         "account",
//!         "/api/account",
//!         "http://account-service:8080",
//!     ))
//!     .with_auth(
//!         AuthConfig::new("change-me-to-a-32-byte-minimum-secret")
//!             .with_excluded_path("/actuator/health"),
//!     );
//!
//! config.validate().expect("gateway config is valid");
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod router;

// ── Flat re-exports ──────────────────────────────────────────────────────────

pub use config::{AuthConfig, GatewayConfig, MIN_SECRET_BYTES};
pub use error::GatewayError;
pub use exchange::{AuthDecision, Exchange, GatewayRequest, GatewayResponse, HttpMethod};
pub use filter::{FilterOrder, Forwarder, GatewayFilter, Next};
pub use router::{RouteConfig, RouteMatch, Router};
