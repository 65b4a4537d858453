//! End-to-end demo: one short auction from listing to settled sale.
//!
//! Run with: `cargo run --bin demo`

use chrono::Duration;
use gavel::{
    AuctionEngine, BidderId, Money, NewListing, PaymentMethod, SellerId,
    config::EngineSettings,
};
use gavel_core::environment::SystemClock;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
#[allow(clippy::expect_used)] // Demo binary, failures should abort loudly
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("gavel=info,demo=info")
        .init();

    let settings = EngineSettings {
        default_auction_duration_secs: 2,
        grace_window_secs: 1,
        bid_attempt_budget: 3,
        settlement_max_attempts: 3,
        settlement_initial_backoff_ms: 100,
        settlement_max_backoff_secs: 1,
        dlq_capacity: 16,
    };
    let engine = AuctionEngine::new(&settings, Arc::new(SystemClock));

    let auction = engine
        .open_auction(NewListing {
            item_name: "Vintage camera".to_string(),
            description: "1970s rangefinder, working meter".to_string(),
            image_ref: None,
            seller: SellerId::new("seller-demo"),
            starting_price: Money::from_dollars(100),
            duration: Some(Duration::seconds(2)),
        })
        .await
        .expect("listing should succeed");
    info!(auction_id = %auction.id, "Auction opened for 2 seconds");

    for (bidder, dollars) in [("alice", 120), ("bob", 120), ("carol", 180)] {
        match engine
            .submit_bid(auction.id, BidderId::new(bidder), Money::from_dollars(dollars))
            .await
        {
            Ok(committed) => info!(bidder, amount = %committed.bid.amount, "Bid accepted"),
            Err(error) => info!(bidder, %error, "Bid rejected"),
        }
    }

    // Wait past the deadline (plus grace) for the clock to close and settle
    tokio::time::sleep(std::time::Duration::from_secs(4)).await;

    let snapshot = engine.auction(auction.id).expect("auction should exist");
    info!(
        phase = %snapshot.phase,
        highest_bid = %snapshot.highest_bid,
        winner = ?snapshot.highest_bidder,
        bids = snapshot.bid_history.len(),
        "Auction finished"
    );

    if let Some(winner) = snapshot.highest_bidder.clone() {
        let record = engine
            .checkout(
                auction.id,
                &winner,
                "1 Main St, Springfield".to_string(),
                PaymentMethod::Card {
                    number: "4242424242424242".to_string(),
                    expiry: "12/27".to_string(),
                },
            )
            .expect("winner checkout should succeed");
        info!(buyer = %record.buyer, amount = %record.amount, "Checkout recorded");
    }

    let stats = engine.stats().await;
    info!(
        auctions = stats.auctions,
        settled = stats.settled,
        payments = stats.payments,
        revenue_cents = stats.revenue_cents,
        "Final stats"
    );
}
