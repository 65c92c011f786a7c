//! Terminal stage of the filter chain: forwards the exchange upstream over
//! HTTP and captures the backend response.
//!
//! Upstream statuses pass through untouched, including 4xx/5xx, so clients
//! can inspect structured backend error bodies.  Only transport failures
//! (connect refused, timeout, truncated body) are converted into a gateway
//! `502`.

use crate::respond;
use async_trait::async_trait;
use pylon_kernel::{Exchange, Forwarder, GatewayRequest, GatewayResponse, HttpMethod, RouteMatch};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Exchange attribute holding the resolved upstream URL, consumed by the
/// observability filter for the end-of-request log line.
pub const TARGET_ATTR: &str = "forward.target";

/// Connection-level headers that must not be replayed from the upstream
/// response onto our own transport.
const HOP_BY_HOP: [&str; 3] = ["connection", "transfer-encoding", "keep-alive"];

/// HTTP reverse-proxy forwarder.
pub struct HttpForwarder {
    client: Client,
}

impl HttpForwarder {
    /// Build the forwarder with a shared connection pool.  `default_timeout_ms`
    /// caps every upstream call unless the matched route overrides it.
    pub fn new(default_timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(default_timeout_ms))
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, mut exchange: Exchange) -> Exchange {
        // The server resolves the route before running the chain; a missing
        // match here means a wiring bug, answered as a gateway failure.
        let Some(route) = exchange.route.clone() else {
            warn!(requestId = %exchange.request.id, "no route attached to exchange");
            exchange.response = Some(respond::error_response(502, "Bad Gateway"));
            return exchange;
        };

        let target = target_url(&route, &exchange.request);
        exchange.set_attr(TARGET_ATTR, &target);
        debug!(
            requestId = %exchange.request.id,
            route_id  = %route.route_id,
            target    = %target,
            "forwarding upstream"
        );

        let mut builder = self
            .client
            .request(reqwest_method(&exchange.request.method), &target);
        for (name, value) in &exchange.request.headers {
            // `host` must name the upstream, and reqwest recomputes the
            // length from the body it is given.
            if name == "host" || name == "content-length" {
                continue;
            }
            builder = builder.header(name, value);
        }
        if route.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(route.timeout_ms));
        }
        if !exchange.request.body.is_empty() {
            builder = builder.body(exchange.request.body.clone());
        }

        exchange.response = Some(match builder.send().await {
            Ok(upstream) => read_response(&exchange.request.id, upstream).await,
            Err(err) => {
                warn!(
                    requestId = %exchange.request.id,
                    target    = %target,
                    error     = %err,
                    "upstream request failed"
                );
                respond::error_response(502, "Bad Gateway")
            }
        });
        exchange
    }
}

/// Join the route endpoint with the original path and query string.
fn target_url(route: &RouteMatch, request: &GatewayRequest) -> String {
    let mut target = format!("{}{}", route.uri.trim_end_matches('/'), request.path);
    if let Some(query) = &request.query {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn reqwest_method(method: &HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        // HttpMethod is #[non_exhaustive]; the ingress only constructs the
        // variants above, so this arm is unreachable through the server.
        _ => reqwest::Method::GET,
    }
}

/// Drain the upstream response into a [`GatewayResponse`], preserving the
/// status verbatim.
async fn read_response(request_id: &str, upstream: reqwest::Response) -> GatewayResponse {
    let status = upstream.status().as_u16();
    let mut response = GatewayResponse::new(status);
    for (name, value) in upstream.headers() {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        if let Ok(v) = value.to_str() {
            response = response.with_header(name.as_str(), v);
        }
    }
    match upstream.bytes().await {
        Ok(body) => response.with_body(body.to_vec()),
        Err(err) => {
            warn!(requestId = %request_id, error = %err, "failed to read upstream body");
            respond::error_response(502, "Bad Gateway")
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(uri: &str) -> RouteMatch {
        RouteMatch {
            route_id: "account".to_string(),
            uri: uri.to_string(),
            timeout_ms: 0,
        }
    }

    #[test]
    fn target_joins_endpoint_path_and_query() {
        let req = GatewayRequest::new("req-1", "/api/account/profile", HttpMethod::Get)
            .with_query("page=2&size=10");
        assert_eq!(
            target_url(&matched("http://127.0.0.1:9000"), &req),
            "http://127.0.0.1:9000/api/account/profile?page=2&size=10"
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_does_not_double_up() {
        let req = GatewayRequest::new("req-1", "/api/account", HttpMethod::Get);
        assert_eq!(
            target_url(&matched("http://127.0.0.1:9000/"), &req),
            "http://127.0.0.1:9000/api/account"
        );
    }

    #[test]
    fn every_method_maps_to_its_reqwest_counterpart() {
        assert_eq!(reqwest_method(&HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(reqwest_method(&HttpMethod::Post), reqwest::Method::POST);
        assert_eq!(reqwest_method(&HttpMethod::Put), reqwest::Method::PUT);
        assert_eq!(reqwest_method(&HttpMethod::Delete), reqwest::Method::DELETE);
        assert_eq!(reqwest_method(&HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(reqwest_method(&HttpMethod::Head), reqwest::Method::HEAD);
        assert_eq!(reqwest_method(&HttpMethod::Options), reqwest::Method::OPTIONS);
    }

    #[tokio::test]
    async fn missing_route_yields_bad_gateway() {
        let forwarder = HttpForwarder::new(1_000);
        let ex = Exchange::new(GatewayRequest::new("req-1", "/x", HttpMethod::Get));
        let done = forwarder.forward(ex).await;
        let resp = done.response.expect("response present");
        assert_eq!(resp.status, 502);
        assert_eq!(resp.body, br#"{"status":1,"message":"Bad Gateway"}"#);
    }

    #[tokio::test]
    async fn connection_refused_yields_bad_gateway() {
        let forwarder = HttpForwarder::new(1_000);
        // Nothing listens on this port; reqwest fails at connect time.
        let ex = Exchange::new(GatewayRequest::new("req-1", "/x", HttpMethod::Get))
            .with_route(matched("http://127.0.0.1:1"));
        let done = forwarder.forward(ex).await;
        assert_eq!(done.response.as_ref().map(|r| r.status), Some(502));
        assert_eq!(
            done.get_attr::<String>(TARGET_ATTR).as_deref(),
            Some("http://127.0.0.1:1/x")
        );
    }
}
