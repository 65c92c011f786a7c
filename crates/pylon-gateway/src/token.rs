//! JWT verification for the authentication filter.
//!
//! [`TokenVerifier`] holds an immutable HMAC-SHA256 decoding key built once
//! at startup and checks signature and expiry on every call.  It never
//! issues tokens; issuance belongs to the identity service that shares the
//! secret.
//!
//! [`AuthError`] is the full authentication failure taxonomy.  The variants
//! are distinguished for internal logs only; at the HTTP boundary every one
//! of them collapses into the same generic `401` so callers cannot probe
//! which check failed.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Claims
// ─────────────────────────────────────────────────────────────────────────────

/// Verified claims extracted from a token.
///
/// Produced only by [`TokenVerifier::verify`]; a value of this type implies
/// the signature checked out and the token had not expired at verification
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token subject: the stable user id.
    pub sub: String,
    /// Display name, forwarded downstream as the user name header.
    #[serde(rename = "userName")]
    pub user_name: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Token kind.  Absent in tokens minted before the claim was introduced;
    /// treated as an access token.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
}

impl Claims {
    /// True when the token is a refresh token, which is only meaningful at
    /// the identity service and never authenticates a proxied call.
    pub fn is_refresh(&self) -> bool {
        matches!(self.token_type, Some(TokenType::Refresh))
    }
}

/// The `type` claim values minted by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// ─────────────────────────────────────────────────────────────────────────────
// AuthError
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication failure taxonomy.
///
/// Messages here end up in warn-level logs, never in response bodies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or one without the `Bearer ` scheme.
    #[error("authorization header is missing or not a bearer credential")]
    MissingOrMalformedHeader,

    /// The signature does not match the configured secret.
    #[error("token signature verification failed")]
    InvalidSignature,

    /// The token is structurally invalid (not a JWT, undecodable payload,
    /// missing required claims).
    #[error("token is malformed")]
    MalformedToken,

    /// The `exp` claim is in the past.
    #[error("token has expired")]
    ExpiredToken,

    /// A refresh token was presented where an access token is required.
    #[error("refresh token presented where an access token is required")]
    WrongTokenType,
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenVerifier
// ─────────────────────────────────────────────────────────────────────────────

/// Stateless HS256 token verifier.
///
/// The decoding key is immutable after construction and the struct holds no
/// interior mutability, so a single instance is shared across all exchanges.
/// Verification is a pure function of the token, the key, and the clock.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the shared signing secret.
    ///
    /// The secret's minimum length (256 bits) is enforced by
    /// [`GatewayConfig::validate`](pylon_kernel::GatewayConfig::validate)
    /// before the verifier is constructed.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock skew allowance: an exp in the past is expired, full stop.
        validation.leeway = 0;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry, returning the claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}

// =============================================================================
// Tests
// =============================================================================
