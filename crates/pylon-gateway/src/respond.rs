//! Canonical JSON error responses synthesized by the gateway.
//!
//! Every gateway-origin error shares one envelope, `{"status":1,"message":…}`,
//! so callers cannot distinguish gateway-synthesized rejections from each
//! other by shape.  The `401` used by the authentication filter carries the
//! fixed message `Unauthorized` regardless of the internal failure reason.

use pylon_kernel::GatewayResponse;
use serde::Serialize;
use tracing::warn;

/// Envelope for gateway-origin errors.  `status` is the application-level
/// error code (`1` = error), distinct from the HTTP status.
#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u32,
    message: &'a str,
}

/// Emitted verbatim when serializing the envelope itself fails; the
/// rejection must never turn into an empty or non-JSON body.
const FALLBACK_BODY: &str = r#"{"status":1,"message":"Server Error"}"#;

/// The canonical rejection for every authentication failure.
pub fn unauthorized() -> GatewayResponse {
    error_response(401, "Unauthorized")
}

/// Build a gateway-origin error response with the shared envelope.
pub fn error_response(status: u16, message: &str) -> GatewayResponse {
    GatewayResponse::new(status)
        .with_header("content-type", "application/json")
        .with_body(error_body(message))
}

fn error_body(message: &str) -> Vec<u8> {
    match serde_json::to_vec(&ErrorBody { status: 1, message }) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "error body serialization failed, falling back to static body");
            FALLBACK_BODY.as_bytes().to_vec()
        }
    }
}
