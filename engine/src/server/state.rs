//! Application state for the auction HTTP server.

use crate::engine::AuctionEngine;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, all interior state is shared) for each request.
#[derive(Clone)]
pub struct AppState {
    /// The auction bidding engine
    pub engine: AuctionEngine,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(engine: AuctionEngine) -> Self {
        Self { engine }
    }
}
