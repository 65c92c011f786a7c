//! Core data types for the gateway kernel contract.
//!
//! These types are shared across the kernel traits
//! ([`GatewayFilter`](crate::filter::GatewayFilter),
//! [`Forwarder`](crate::filter::Forwarder),
//! [`Router`](crate::router::Router)) and carry no runtime dependencies
//! beyond `serde` and `std`.

use crate::router::RouteMatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering the standard verbs seen at a proxy boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// An inbound request flowing through the gateway.
///
/// All fields use owned types so the value can cross async task boundaries
/// without lifetime complications.  Header names are stored lowercased and
/// the map holds a single value per name; when the transport delivers
/// duplicate headers, the first value wins at ingress conversion.
///
/// Header rewrites go through the by-value builders ([`with_header`],
/// [`without_header`]): each stage that changes headers consumes the request
/// and produces a new value, so no stage ever observes a partially modified
/// request owned by another stage.
///
/// [`with_header`]: Self::with_header
/// [`without_header`]: Self::without_header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Unique identifier assigned once at ingress, correlating every log
    /// line emitted for this request.
    pub id: String,
    /// Request path without the query string, e.g. `/api/account/profile`.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// HTTP headers (header names are lowercased, single value per name).
    pub headers: HashMap<String, String>,
    /// Transport-level peer address, when the listener can provide one.
    pub remote_addr: Option<SocketAddr>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl GatewayRequest {
    /// Construct a minimal request with the given id, path, and method.
    pub fn new(id: impl Into<String>, path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            query: None,
            method,
            headers: HashMap::new(),
            remote_addr: None,
            body: Vec::new(),
        }
    }

    /// Builder: set (or replace) a header.  The name is lowercased.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Builder: remove a header if present.  Lookup is case-insensitive.
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(&name.to_lowercase());
        self
    }

    /// Builder: set the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builder: set the transport peer address.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Builder: set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// An outbound response returned through the gateway, whether proxied from
/// a backend or synthesized by a filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// HTTP status code (100–599).
    pub status: u16,
    /// Response headers (names lowercased).
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// Construct an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Builder: set (or replace) a header.  The name is lowercased.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Builder: set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication decision
// ─────────────────────────────────────────────────────────────────────────────

/// The authentication outcome for one exchange.
///
/// Recorded on the [`Exchange`] exactly once by the authentication filter
/// and never mutated afterwards.  Downstream consumers (logging, audit)
/// read it; nothing rewrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// The path is on the exclusion list; no credentials were examined.
    Excluded,
    /// A token verified successfully; identity headers carry these values.
    Authenticated {
        /// Token subject, forwarded as the user id header.
        user_id: String,
        /// Display name claim, forwarded as the user name header.
        user_name: String,
    },
    /// Authentication failed.  The reason is for internal logs only and is
    /// never surfaced to the caller.
    Rejected {
        /// Internal failure description (missing header, bad signature, …).
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange
// ─────────────────────────────────────────────────────────────────────────────

/// Per-request carrier that flows through the filter chain.
///
/// A filter receives the exchange by value, may rebuild its request, attach
/// a response (short-circuit), or record its decision, and hands it on.
/// Alongside the typed fields a free-form `attributes` map carries
/// cross-stage metadata, e.g. the forwarder records the resolved target URI
/// there so the completion log can report it.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The inbound request (rebuilt by stages that rewrite headers).
    pub request: GatewayRequest,
    /// The response; `None` until a filter short-circuits or the terminal
    /// forwarder completes.
    pub response: Option<GatewayResponse>,
    /// Populated by the server before the chain runs; `None` in contexts
    /// without routing (tests, synthetic exchanges).
    pub route: Option<RouteMatch>,
    /// Authentication outcome, recorded once by the auth filter.
    pub decision: Option<AuthDecision>,
    /// Free-form attributes written and read by stages.
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Exchange {
    /// Create a fresh exchange from an inbound request.
    pub fn new(request: GatewayRequest) -> Self {
        Self {
            request,
            response: None,
            route: None,
            decision: None,
            attributes: HashMap::new(),
        }
    }

    /// Builder: attach the matched route.
    pub fn with_route(mut self, route: RouteMatch) -> Self {
        self.route = Some(route);
        self
    }

    /// Convenience: read a typed attribute, returning `None` if absent or
    /// if deserialization fails.
    pub fn get_attr<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Convenience: write a serializable attribute.
    pub fn set_attr<T: serde::Serialize>(&mut self, key: impl Into<String>, val: &T) {
        if let Ok(v) = serde_json::to_value(val) {
            self.attributes.insert(key.into(), v);
        }
    }
}
