//! Request filters and the ordered chain that runs them.
//!
//! The chain sorts its filters by [`FilterOrder`] once at construction, so
//! callers can register them in any order and still get the observability
//! filter outermost and authentication inside it.

mod auth;
mod observability;

pub use auth::{ExcludedPaths, JwtAuthFilter};
pub use observability::ObservabilityFilter;

use pylon_kernel::{Exchange, Forwarder, GatewayFilter, Next};
use std::sync::Arc;

/// Immutable, pre-sorted filter pipeline.
pub struct FilterChain {
    filters: Vec<Arc<dyn GatewayFilter>>,
}

impl FilterChain {
    /// Sort the filters by ascending order value.  Lower values run first
    /// (outermost), so they see the request earliest and the response last.
    pub fn new(mut filters: Vec<Arc<dyn GatewayFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    /// Run the exchange through every filter and, unless one of them
    /// short-circuits, hand it to the terminal forwarder.
    pub async fn execute(&self, exchange: Exchange, forwarder: &dyn Forwarder) -> Exchange {
        Next::new(&self.filters, forwarder).run(exchange).await
    }

    /// Filter names in execution order, for startup logging.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
