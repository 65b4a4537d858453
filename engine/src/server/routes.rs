//! Router configuration for the auction engine.
//!
//! Builds the complete Axum router with all endpoints. Every operation has
//! exactly one route and one field contract; all entry points normalize to
//! the domain model at this boundary.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, auctions, bids, payments};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks
/// - Auction listing and snapshot endpoints
/// - Bid submission
/// - Winner checkout
/// - Administrative endpoints (force close, settlement retry, payments, stats)
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/auctions/:id/close", post(admin::force_close))
        .route("/auctions/:id", delete(admin::delete_auction))
        .route(
            "/auctions/:id/settlement/retry",
            post(admin::retry_settlement),
        )
        .route("/payments", get(payments::list_payments))
        .route("/stats", get(admin::stats));

    let api_routes = Router::new()
        // Auctions
        .route("/auctions", post(auctions::create_auction))
        .route("/auctions", get(auctions::list_auctions))
        .route("/auctions/:id", get(auctions::get_auction))
        // Bidding
        .route("/auctions/:id/bids", post(bids::submit_bid))
        // Winner checkout
        .route("/auctions/:id/checkout", post(payments::checkout))
        // Administrative surface
        .nest("/admin", admin_routes);

    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .with_state(state)
}
