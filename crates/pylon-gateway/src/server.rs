//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires the route table, filter chain and upstream
//! forwarder into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`, never filtered. |
//! | `ANY`  | `/*` | Resolved against the route table and proxied through the filter chain. |

use crate::config::Settings;
use crate::filter::{ExcludedPaths, FilterChain, JwtAuthFilter, ObservabilityFilter};
use crate::proxy::HttpForwarder;
use crate::respond;
use crate::router::PrefixRouter;
use crate::token::TokenVerifier;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use pylon_kernel::{
    Exchange, GatewayConfig, GatewayError, GatewayFilter, GatewayRequest, GatewayResponse,
    HttpMethod, Router as _,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into every axum handler via [`State`] extractor.
/// The route table is immutable after startup, so no locking is needed.
#[derive(Clone)]
struct AppState {
    router: Arc<PrefixRouter>,
    chain: Arc<FilterChain>,
    forwarder: Arc<HttpForwarder>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced by [`GatewayServer::start`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] GatewayError),

    #[error("failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),
}

/// High-level gateway server encapsulating route table, filter chain and
/// forwarder.
pub struct GatewayServer {
    port: u16,
}

impl GatewayServer {
    /// Create a server listening on the given TCP port.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Convenience constructor pulling the port from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.port)
    }

    /// Build the axum [`Router`] wired to the provided [`GatewayConfig`].
    ///
    /// Validates the config, registers routes, and constructs the filter
    /// chain.  Call [`start()`](Self::start) to bind and serve.
    pub fn build_app(config: &GatewayConfig) -> Result<Router, GatewayError> {
        config.validate()?;

        let mut router = PrefixRouter::new();
        for route in &config.routes {
            router.register(route.clone())?;
        }

        let filters: Vec<Arc<dyn GatewayFilter>> = vec![
            Arc::new(ObservabilityFilter::new()),
            Arc::new(JwtAuthFilter::new(
                TokenVerifier::new(&config.auth.secret),
                ExcludedPaths::new(config.auth.excluded_paths.clone()),
            )),
        ];
        let chain = FilterChain::new(filters);
        info!(
            gateway_id = %config.id,
            filters    = ?chain.names(),
            routes     = config.routes.len(),
            "gateway pipeline assembled"
        );

        let state = AppState {
            router: Arc::new(router),
            chain: Arc::new(chain),
            forwarder: Arc::new(HttpForwarder::new(config.request_timeout_ms)),
        };

        Ok(Router::new()
            .route("/health", get(health_handler))
            .fallback(proxy_handler)
            .with_state(state))
    }

    /// Bind the server to `0.0.0.0:{port}` and serve until the process exits.
    pub async fn start(self, config: GatewayConfig) -> Result<(), ServeError> {
        let app = Self::build_app(&config)?;
        let addr = format!("0.0.0.0:{}", self.port);
        info!(addr = %addr, gateway_id = %config.id, "Pylon gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "pylon-gateway" }))
}

/// Catch-all proxy handler: resolve the route, run the filter chain, relay
/// the resulting response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(http_method) = kernel_method(&method) else {
        return into_axum_response(respond::error_response(405, "Method Not Allowed"));
    };
    let request_id = Uuid::new_v4().to_string();
    let path = uri.path().to_string();

    let mut req = GatewayRequest::new(&request_id, &path, http_method)
        .with_remote_addr(remote)
        .with_body(body.to_vec());
    if let Some(query) = uri.query() {
        req = req.with_query(query);
    }
    // Duplicate header names keep the first value seen on the wire.
    for (name, value) in &headers {
        if let Ok(v) = value.to_str() {
            req.headers
                .entry(name.as_str().to_lowercase())
                .or_insert_with(|| v.to_string());
        }
    }

    let Some(matched) = state.router.resolve(&path) else {
        return into_axum_response(respond::error_response(404, "Not Found"));
    };

    let exchange = Exchange::new(req).with_route(matched);
    let done = state.chain.execute(exchange, state.forwarder.as_ref()).await;

    match done.response {
        Some(response) => into_axum_response(response),
        // The terminal forwarder always attaches a response; this arm only
        // exists so a future filter bug degrades into a 502 instead of a panic.
        None => into_axum_response(respond::error_response(502, "Bad Gateway")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Convert an axum [`Method`] to the kernel [`HttpMethod`].
///
/// Returns `None` for methods outside the kernel enum (e.g. `CONNECT`,
/// `TRACE`); callers answer those with `405 Method Not Allowed`.
fn kernel_method(m: &Method) -> Option<HttpMethod> {
    match m.as_str() {
        "GET"     => Some(HttpMethod::Get),
        "POST"    => Some(HttpMethod::Post),
        "PUT"     => Some(HttpMethod::Put),
        "PATCH"   => Some(HttpMethod::Patch),
        "DELETE"  => Some(HttpMethod::Delete),
        "HEAD"    => Some(HttpMethod::Head),
        "OPTIONS" => Some(HttpMethod::Options),
        _         => None,
    }
}

/// Render a [`GatewayResponse`] onto the axum transport.  Header names or
/// values that are not valid on the wire are dropped rather than panicking.
fn into_axum_response(resp: GatewayResponse) -> Response {
    let mut out = Response::new(Body::from(resp.body));
    *out.status_mut() =
        StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &resp.headers {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            continue;
        };
        let Ok(value) = HeaderValue::try_from(value.as_str()) else {
            continue;
        };
        out.headers_mut().insert(name, value);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use pylon_kernel::{AuthConfig, RouteConfig};
    use tower::util::ServiceExt;

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn test_config() -> GatewayConfig {
        GatewayConfig::new("pylon-test")
            .with_route(RouteConfig::new("account", "/api/account", "http://127.0.0.1:1"))
            .with_auth(
                AuthConfig::new(TEST_SECRET).with_excluded_path("/actuator/health"),
            )
    }

    fn request(method: &str, path: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        req
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_at_build_time() {
        let config = GatewayConfig::new("pylon-test")
            .with_route(RouteConfig::new("account", "/api/account", "http://127.0.0.1:1"))
            .with_auth(AuthConfig::new("short"));
        let err = GatewayServer::build_app(&config).unwrap_err();
        assert_eq!(err, GatewayError::SecretTooShort(5));
    }

    #[tokio::test]
    async fn health_endpoint_answers_without_authentication() {
        let app = GatewayServer::build_app(&test_config()).unwrap();
        let resp = app.oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn unmatched_path_gets_the_canonical_not_found_body() {
        let app = GatewayServer::build_app(&test_config()).unwrap();
        let resp = app.oneshot(request("GET", "/nowhere")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_string(resp).await,
            r#"{"status":1,"message":"Not Found"}"#
        );
    }

    #[tokio::test]
    async fn unsupported_method_gets_405() {
        let app = GatewayServer::build_app(&test_config()).unwrap();
        let resp = app
            .oneshot(request("TRACE", "/api/account/profile"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn matched_route_without_token_gets_the_canonical_401() {
        let app = GatewayServer::build_app(&test_config()).unwrap();
        let resp = app
            .oneshot(request("GET", "/api/account/profile"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(resp).await,
            r#"{"status":1,"message":"Unauthorized"}"#
        );
    }

    #[tokio::test]
    async fn excluded_path_skips_authentication_and_reaches_the_forwarder() {
        // No upstream listens on port 1, so reaching the forwarder shows up
        // as a 502 rather than a 401.
        let config = GatewayConfig::new("pylon-test")
            .with_route(RouteConfig::new("probe", "/actuator", "http://127.0.0.1:1"))
            .with_auth(AuthConfig::new(TEST_SECRET).with_excluded_path("/actuator/health"));
        let app = GatewayServer::build_app(&config).unwrap();
        let resp = app
            .oneshot(request("GET", "/actuator/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
