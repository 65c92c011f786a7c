//! Request/response observability filter.
//!
//! Outermost filter in the chain: emits a `[Request Start]` line and one
//! debug line per header at ingress, then exactly one `[Request End]` line
//! when the exchange finishes, whatever finishing looks like.  The end line
//! is owned by a [`CompletionGuard`]: the normal path disarms it after the
//! continuation returns, and if the exchange future is dropped mid-flight
//! (client disconnect, task cancellation) the guard's `Drop` emits the line
//! instead.  Either way the line fires once.
//!
//! The filter observes and never alters control flow: the exchange comes
//! back exactly as downstream produced it.

use crate::proxy::TARGET_ATTR;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pylon_kernel::{Exchange, FilterOrder, GatewayFilter, GatewayRequest, HttpMethod, Next};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Headers whose values never reach the logs; the marker below is recorded
/// in their place.
const SENSITIVE_HEADERS: [&str; 4] = ["authorization", "cookie", "jwt", "api-key"];

/// Marker logged in place of a sensitive header value.
const REDACTED: &str = "[PROTECTED]";

/// Requests slower than this (strictly greater, in milliseconds) get an
/// additional `[Slow Request]` warning.
const SLOW_THRESHOLD_MS: u64 = 3000;

// ─────────────────────────────────────────────────────────────────────────────
// RequestRecord
// ─────────────────────────────────────────────────────────────────────────────

/// Per-request log record, built incrementally: the fields below are
/// captured at ingress, the rest (status, route, target, duration) are
/// resolved when the exchange completes.
#[derive(Debug)]
struct RequestRecord {
    request_id: String,
    method: HttpMethod,
    path: String,
    client_ip: String,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RequestRecord {
    fn at_ingress(request: &GatewayRequest) -> Self {
        Self {
            request_id: request.id.clone(),
            method: request.method.clone(),
            path: request.path.clone(),
            client_ip: client_ip(request),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    fn log_start(&self) {
        info!(
            requestId   = %self.request_id,
            httpMethod  = %self.method,
            requestPath = %self.path,
            clientIP    = %self.client_ip,
            timestamp   = %self.started_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            "[Request Start]"
        );
    }

    /// Emit the end line (severity by status class) and the slow-request
    /// warning when applicable.  Absent values render as `unknown`.
    fn log_end(self, status: Option<u16>, route: &str, target: &str) {
        let duration_ms = self.duration_ms();
        let status_text = match status {
            Some(s) => s.to_string(),
            None => "unknown".to_string(),
        };

        match status {
            Some(s) if s >= 500 => error!(
                requestId   = %self.request_id,
                httpMethod  = %self.method,
                requestPath = %self.path,
                status      = %status_text,
                route       = %route,
                target      = %target,
                duration_ms,
                "[Request End]"
            ),
            Some(s) if s >= 400 => warn!(
                requestId   = %self.request_id,
                httpMethod  = %self.method,
                requestPath = %self.path,
                status      = %status_text,
                route       = %route,
                target      = %target,
                duration_ms,
                "[Request End]"
            ),
            _ => info!(
                requestId   = %self.request_id,
                httpMethod  = %self.method,
                requestPath = %self.path,
                status      = %status_text,
                route       = %route,
                target      = %target,
                duration_ms,
                "[Request End]"
            ),
        }

        if is_slow(duration_ms) {
            warn!(
                requestId    = %self.request_id,
                httpMethod   = %self.method,
                requestPath  = %self.path,
                status       = %status_text,
                duration_ms,
                threshold_ms = SLOW_THRESHOLD_MS,
                "[Slow Request]"
            );
        }
    }

    fn duration_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompletionGuard
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the pending end-of-request log line.
///
/// [`complete`](Self::complete) consumes the record on the normal path;
/// `Drop` fires it with unknown status if the exchange future never got
/// that far.  The `Option` makes the two paths mutually exclusive.
struct CompletionGuard {
    record: Option<RequestRecord>,
}

impl CompletionGuard {
    fn new(record: RequestRecord) -> Self {
        Self {
            record: Some(record),
        }
    }

    fn complete(&mut self, exchange: &Exchange) {
        if let Some(record) = self.record.take() {
            let status = exchange.response.as_ref().map(|r| r.status);
            let route = exchange
                .route
                .as_ref()
                .map(|r| r.route_id.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let target = exchange
                .get_attr::<String>(TARGET_ATTR)
                .unwrap_or_else(|| "unknown".to_string());
            record.log_end(status, &route, &target);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            record.log_end(None, "unknown", "unknown");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ObservabilityFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Outermost filter: request/response logging with guaranteed completion.
#[derive(Default)]
pub struct ObservabilityFilter;

impl ObservabilityFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for ObservabilityFilter {
    fn name(&self) -> &str {
        "observability"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::OBSERVABILITY
    }

    async fn filter(&self, exchange: Exchange, next: Next<'_>) -> Exchange {
        let record = RequestRecord::at_ingress(&exchange.request);
        record.log_start();
        log_headers(&exchange.request);

        let mut guard = CompletionGuard::new(record);
        let exchange = next.run(exchange).await;
        guard.complete(&exchange);
        exchange
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn log_headers(request: &GatewayRequest) {
    for (name, value) in &request.headers {
        let shown = if is_sensitive(name) {
            REDACTED
        } else {
            value.as_str()
        };
        debug!(
            requestId = %request.id,
            header    = %name,
            value     = %shown,
            "[Request Header]"
        );
    }
}

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(name))
}

fn is_slow(duration_ms: u64) -> bool {
    duration_ms > SLOW_THRESHOLD_MS
}

/// Resolve the calling client's IP: the first entry of a non-empty
/// `X-Forwarded-For`, else the transport peer address, else `unknown`.
fn client_ip(request: &GatewayRequest) -> String {
    if let Some(xff) = request.header("x-forwarded-for") {
        if !xff.is_empty() {
            return xff.split(',').next().unwrap_or_default().trim().to_string();
        }
    }
    match request.remote_addr {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_kernel::{Forwarder, GatewayResponse};
    use std::net::SocketAddr;
    use std::sync::Arc;

    fn request() -> GatewayRequest {
        GatewayRequest::new("req-1", "/api/account/profile", HttpMethod::Get)
    }

    // ── Client IP resolution ──────────────────────────────────────────────────

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let req = request().with_header("x-forwarded-for", "203.0.113.9, 10.0.0.1, 10.0.0.2");
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn client_ip_trims_whitespace_around_the_entry() {
        let req = request().with_header("x-forwarded-for", "  203.0.113.9 , 10.0.0.1");
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn client_ip_single_entry_without_comma() {
        let req = request().with_header("x-forwarded-for", "198.51.100.7");
        assert_eq!(client_ip(&req), "198.51.100.7");
    }

    #[test]
    fn client_ip_empty_header_falls_back_to_remote_addr() {
        let addr: SocketAddr = "192.0.2.4:55321".parse().unwrap();
        let req = request()
            .with_header("x-forwarded-for", "")
            .with_remote_addr(addr);
        assert_eq!(client_ip(&req), "192.0.2.4");
    }

    #[test]
    fn client_ip_remote_addr_drops_the_port() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let req = request().with_remote_addr(addr);
        assert_eq!(client_ip(&req), "127.0.0.1");
    }

    #[test]
    fn client_ip_unknown_when_nothing_available() {
        assert_eq!(client_ip(&request()), "unknown");
    }

    // ── Sensitive headers ─────────────────────────────────────────────────────

    #[test]
    fn sensitive_set_matches_case_insensitively() {
        assert!(is_sensitive("authorization"));
        assert!(is_sensitive("Authorization"));
        assert!(is_sensitive("COOKIE"));
        assert!(is_sensitive("jwt"));
        assert!(is_sensitive("Api-Key"));
        assert!(!is_sensitive("content-type"));
        assert!(!is_sensitive("x-forwarded-for"));
    }

    // ── Slow threshold ────────────────────────────────────────────────────────

    #[test]
    fn slow_threshold_is_strict() {
        assert!(!is_slow(2999));
        assert!(!is_slow(3000));
        assert!(is_slow(3001));
    }

    // ── Completion guard ──────────────────────────────────────────────────────

    #[test]
    fn guard_is_disarmed_after_complete() {
        let mut guard = CompletionGuard::new(RequestRecord::at_ingress(&request()));
        let mut exchange = Exchange::new(request());
        exchange.response = Some(GatewayResponse::new(200));
        guard.complete(&exchange);
        assert!(guard.record.is_none());
        // Drop now has nothing left to emit.
    }

    #[test]
    fn complete_twice_only_consumes_once() {
        let mut guard = CompletionGuard::new(RequestRecord::at_ingress(&request()));
        let exchange = Exchange::new(request());
        guard.complete(&exchange);
        guard.complete(&exchange);
        assert!(guard.record.is_none());
    }

    // ── Filter pass-through ───────────────────────────────────────────────────

    struct StubForwarder;

    #[async_trait]
    impl Forwarder for StubForwarder {
        async fn forward(&self, mut exchange: Exchange) -> Exchange {
            exchange.response = Some(GatewayResponse::new(204).with_header("x-probe", "kept"));
            exchange
        }
    }

    #[tokio::test]
    async fn filter_returns_the_downstream_exchange_unchanged() {
        let filter = ObservabilityFilter::new();
        let filters: Vec<Arc<dyn GatewayFilter>> = Vec::new();
        let next = Next::new(&filters, &StubForwarder);

        let done = filter.filter(Exchange::new(request()), next).await;
        let resp = done.response.expect("downstream response kept");
        assert_eq!(resp.status, 204);
        assert_eq!(resp.headers.get("x-probe").map(String::as_str), Some("kept"));
    }
}
