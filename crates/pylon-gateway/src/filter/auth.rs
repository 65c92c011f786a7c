//! JWT authentication filter.
//!
//! Every request that is not on the excluded-path list must carry
//! `Authorization: Bearer <token>` with a verifiable signature and a live
//! expiry.  Verified requests are forwarded with the gateway-owned identity
//! headers (`x-user-id`, `x-user-name`) rebuilt from the token claims;
//! whatever the client sent in those headers is dropped first, on every
//! path, so downstream services can trust them unconditionally.
//!
//! All failures produce the same canonical `401` body.  The concrete reason
//! (missing header, bad signature, expired, …) is logged at warn level and
//! never surfaced to the caller.

use crate::respond;
use crate::token::{AuthError, Claims, TokenVerifier};
use async_trait::async_trait;
use pylon_kernel::{AuthDecision, Exchange, FilterOrder, GatewayFilter, GatewayRequest, Next};
use tracing::{debug, warn};

/// Identity header rebuilt from the token subject.
const X_USER_ID: &str = "x-user-id";
/// Identity header rebuilt from the token's display-name claim.
const X_USER_NAME: &str = "x-user-name";
/// Required `Authorization` scheme prefix, case-sensitive.
const BEARER_PREFIX: &str = "Bearer ";

// ─────────────────────────────────────────────────────────────────────────────
// ExcludedPaths
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered list of path prefixes that bypass authentication (health probes,
/// webhook callbacks with their own signature schemes).
///
/// Matching is prefix-based against the percent-decoded request path,
/// tested in list order.
#[derive(Debug, Clone)]
pub struct ExcludedPaths {
    prefixes: Vec<String>,
}

impl ExcludedPaths {
    /// Build the list from configuration, preserving order.
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `path` starts with any configured prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JwtAuthFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication filter enforcing bearer-token verification.
pub struct JwtAuthFilter {
    verifier: TokenVerifier,
    excluded: ExcludedPaths,
}

impl JwtAuthFilter {
    /// Build the filter from a verifier and the exclusion list.
    pub fn new(verifier: TokenVerifier, excluded: ExcludedPaths) -> Self {
        Self { verifier, excluded }
    }

    /// Extract and verify the bearer credential.  Refresh tokens never
    /// authenticate a proxied call.
    fn authenticate(&self, request: &GatewayRequest) -> Result<Claims, AuthError> {
        let header = request
            .header("authorization")
            .ok_or(AuthError::MissingOrMalformedHeader)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::MissingOrMalformedHeader)?;
        let claims = self.verifier.verify(token)?;
        if claims.is_refresh() {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }
}

#[async_trait]
impl GatewayFilter for JwtAuthFilter {
    fn name(&self) -> &str {
        "jwt-auth"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::AUTH
    }

    async fn filter(&self, mut exchange: Exchange, next: Next<'_>) -> Exchange {
        // Classification happens on the decoded path so an encoded probe
        // cannot dodge the exclusion list semantics.
        let decoded_path = urlencoding::decode(&exchange.request.path)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| exchange.request.path.clone());

        if self.excluded.matches(&decoded_path) {
            debug!(
                requestId   = %exchange.request.id,
                requestPath = %decoded_path,
                "excluded path, skipping token verification"
            );
            exchange.request = strip_trust_headers(exchange.request);
            exchange.decision = Some(AuthDecision::Excluded);
            return next.run(exchange).await;
        }

        match self.authenticate(&exchange.request) {
            Ok(claims) => {
                exchange.request = strip_trust_headers(exchange.request)
                    .with_header(X_USER_ID, claims.sub.as_str())
                    .with_header(X_USER_NAME, claims.user_name.as_str());
                exchange.decision = Some(AuthDecision::Authenticated {
                    user_id: claims.sub,
                    user_name: claims.user_name,
                });
                next.run(exchange).await
            }
            Err(reason) => {
                warn!(
                    requestId   = %exchange.request.id,
                    requestPath = %decoded_path,
                    reason      = %reason,
                    "rejected unauthenticated request"
                );
                exchange.decision = Some(AuthDecision::Rejected {
                    reason: reason.to_string(),
                });
                exchange.response = Some(respond::unauthorized());
                exchange
            }
        }
    }
}

/// Drop the client-supplied identity headers.  Runs on every path, so the
/// only way those headers reach a backend is via the injection above.
fn strip_trust_headers(request: GatewayRequest) -> GatewayRequest {
    request.without_header(X_USER_ID).without_header(X_USER_NAME)
}

// =============================================================================
// Tests
// =============================================================================
