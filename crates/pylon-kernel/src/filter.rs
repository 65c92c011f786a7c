//! Gateway filter trait and chain-composition types.
//!
//! The pipeline is an ordered list of [`GatewayFilter`] instances applied to
//! every exchange.  Filters are sorted by their declared [`FilterOrder`] at
//! startup (lowest value outermost) and composed as middleware: each filter
//! receives the exchange plus a [`Next`] continuation and decides whether to
//! invoke it.
//!
//! ```text
//! Exchange ──► Observability ──► Auth ──► Forwarder (backend call)
//!                   │                │
//!                   │                └─ short-circuit: attach response,
//!                   │                   skip the continuation
//!                   └─ completion work runs after the continuation
//!                      returns, on every exit path
//! ```
//!
//! Because a filter's post-continuation code is ordinary code after an
//! `.await`, an outer filter can wrap the entire downstream in
//! acquire/release scoping.  The trait boundary is infallible: every
//! internal failure mode is expressed as a response on the exchange, so no
//! error path can bypass an outer filter.

use crate::exchange::Exchange;
use async_trait::async_trait;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Filter ordering
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric ordering slot for a filter in the chain.
///
/// The well-known slots below act as guidelines; any `u32` value is accepted
/// so deployments can slot custom filters between the standard phases.
/// Filters with equal order values keep registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    /// Outermost slot: request/response logging and completion accounting.
    /// Runs first on the way in and therefore last on the way out.
    pub const OBSERVABILITY: FilterOrder = FilterOrder(0);
    /// Authentication slot (token verification, identity header injection).
    pub const AUTH: FilterOrder = FilterOrder(100);
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayFilter trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for a single filter in the gateway pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Stable, human-readable identifier for this filter (used in logs).
    fn name(&self) -> &str;

    /// Position in the chain.  Lower values run first on the request path
    /// and last on the response path.
    fn order(&self) -> FilterOrder;

    /// Process one exchange.
    ///
    /// Call `next.run(exchange).await` to hand the exchange to the rest of
    /// the chain and regain control once downstream work has finished.  To
    /// short-circuit, attach a response to the exchange and return without
    /// invoking `next`.
    async fn filter(&self, exchange: Exchange, next: Next<'_>) -> Exchange;
}

// ─────────────────────────────────────────────────────────────────────────────
// Forwarder trait
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal stage of the chain: the "forward to the next processing stage"
/// capability consumed from the surrounding runtime.
///
/// Implementations proxy the request to the matched backend and attach the
/// backend's response to the exchange.  Transport failures are expressed as
/// a synthesized response, never as a panic or an early return past the
/// chain.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward the exchange downstream and return it with a response set.
    async fn forward(&self, exchange: Exchange) -> Exchange;
}

// ─────────────────────────────────────────────────────────────────────────────
// Next
// ─────────────────────────────────────────────────────────────────────────────

/// Continuation handed to each filter: the remaining filters plus the
/// terminal [`Forwarder`].
///
/// `run` consumes the continuation, so a filter can invoke downstream at
/// most once per exchange.
pub struct Next<'a> {
    filters: &'a [Arc<dyn GatewayFilter>],
    terminal: &'a dyn Forwarder,
}

impl<'a> Next<'a> {
    /// Build the continuation for an order-sorted filter slice.
    pub fn new(filters: &'a [Arc<dyn GatewayFilter>], terminal: &'a dyn Forwarder) -> Self {
        Self { filters, terminal }
    }

    /// Run the exchange through the remaining filters, then the terminal.
    pub async fn run(self, exchange: Exchange) -> Exchange {
        match self.filters.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    filters: rest,
                    terminal: self.terminal,
                };
                head.filter(exchange, next).await
            }
            None => self.terminal.forward(exchange).await,
        }
    }
}
