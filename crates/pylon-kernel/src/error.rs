//! Gateway error types for `pylon-kernel`.
//!
//! [`GatewayError`] covers every failure mode that can be detected at
//! *definition time*: empty ids, duplicate registrations, invalid
//! configuration values, before any network I/O occurs.  Runtime failures
//! (authentication rejections, upstream transport errors) belong in the
//! gateway implementation crate (`pylon-gateway`).

use thiserror::Error;

/// Configuration-time error type for the gateway kernel contract.
///
/// The enum is `#[non_exhaustive]` so future releases can add new failure
/// modes without breaking existing `match` arms.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Identity ────────────────────────────────────────────────────────────
    /// The gateway configuration `id` field is empty or whitespace-only.
    #[error("gateway id cannot be empty")]
    EmptyGatewayId,

    // ── Routes ──────────────────────────────────────────────────────────────
    /// The configuration contains no routes.
    #[error("gateway config must define at least one route")]
    NoRoutes,

    /// A route `id` field is empty or whitespace-only.
    #[error("route id cannot be empty")]
    EmptyRouteId,

    /// A route with this id has already been registered.
    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),

    /// A route path prefix is syntactically invalid.
    #[error("route '{0}' has an invalid path prefix: {1}")]
    InvalidPathPrefix(String, String),

    /// A route backend URI is syntactically invalid.
    #[error("route '{0}' has an invalid backend uri: {1}")]
    InvalidEndpoint(String, String),

    // ── Timeouts ────────────────────────────────────────────────────────────
    /// `request_timeout_ms` is zero, which would reject every request.
    #[error("request timeout must be greater than 0 ms")]
    InvalidTimeout,

    // ── Auth ────────────────────────────────────────────────────────────────
    /// The token-signing secret is shorter than the 256 bits HMAC-SHA256
    /// requires.  The message carries only the length, never the value.
    #[error("auth secret must be at least 32 bytes, got {0}")]
    SecretTooShort(usize),

    /// An excluded-path entry is not a valid path prefix.
    #[error("excluded path '{0}' must start with '/'")]
    InvalidExcludedPath(String),
}
