//! Auction lifecycle integration tests.
//!
//! Exercises the server-owned clock end to end: deadline closes, no-sale
//! auctions, grace-window extensions, force closes, and the freeze of the
//! highest bid once an auction leaves `Open`.
//!
//! Run with: `cargo test --test lifecycle_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::Duration;
use gavel::config::EngineSettings;
use gavel::{
    AuctionEngine, AuctionPhase, BidderId, EngineError, Money, NewListing, RejectReason, SellerId,
};
use gavel_core::environment::SystemClock;
use std::sync::Arc;

fn fast_settings() -> EngineSettings {
    EngineSettings {
        default_auction_duration_secs: 60,
        grace_window_secs: 1,
        bid_attempt_budget: 3,
        settlement_max_attempts: 3,
        settlement_initial_backoff_ms: 10,
        settlement_max_backoff_secs: 1,
        dlq_capacity: 16,
    }
}

fn listing(duration: Duration, dollars: u64) -> NewListing {
    NewListing {
        item_name: "Vintage camera".to_string(),
        description: "1970s rangefinder".to_string(),
        image_ref: None,
        seller: SellerId::new("seller-1"),
        starting_price: Money::from_dollars(dollars),
        duration: Some(duration),
    }
}

/// Poll until the auction reaches `phase` or the timeout expires.
async fn wait_for_phase(
    engine: &AuctionEngine,
    id: gavel::AuctionId,
    phase: AuctionPhase,
    timeout: std::time::Duration,
) {
    let start = std::time::Instant::now();
    loop {
        let snapshot = engine.auction(id).expect("auction should exist");
        if snapshot.phase == phase {
            return;
        }
        assert!(
            start.elapsed() < timeout,
            "auction {id} did not reach {phase} within {timeout:?}, still {}",
            snapshot.phase
        );
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn deadline_with_zero_bids_closes_without_settlement() {
    let engine = AuctionEngine::new(&fast_settings(), Arc::new(SystemClock));
    let auction = engine
        .open_auction(listing(Duration::milliseconds(200), 100))
        .await
        .unwrap();

    wait_for_phase(&engine, auction.id, AuctionPhase::Closed, std::time::Duration::from_secs(3)).await;

    let snapshot = engine.auction(auction.id).unwrap();
    assert!(snapshot.highest_bidder.is_none());
    assert_eq!(snapshot.highest_bid, Money::from_dollars(100));
    assert!(
        engine.payment_records().is_empty(),
        "settlement must be skipped when no bid was placed"
    );

    // No sale means no settlement: the auction never becomes Settled
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(engine.auction(auction.id).unwrap().phase, AuctionPhase::Closed);
}

#[tokio::test]
async fn deadline_with_winner_settles_and_records_one_payment() {
    let engine = AuctionEngine::new(&fast_settings(), Arc::new(SystemClock));
    let auction = engine
        .open_auction(listing(Duration::milliseconds(300), 100))
        .await
        .unwrap();

    engine
        .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
        .await
        .unwrap();

    wait_for_phase(&engine, auction.id, AuctionPhase::Settled, std::time::Duration::from_secs(5)).await;

    let snapshot = engine.auction(auction.id).unwrap();
    assert_eq!(snapshot.highest_bid, Money::from_dollars(150));
    assert_eq!(snapshot.highest_bidder, Some(BidderId::new("alice")));

    let records = engine.payment_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].buyer, BidderId::new("alice"));
    assert_eq!(records[0].amount, Money::from_dollars(150));
}

#[tokio::test]
async fn closed_auction_freezes_the_highest_bid() {
    let engine = AuctionEngine::new(&fast_settings(), Arc::new(SystemClock));
    let auction = engine
        .open_auction(listing(Duration::milliseconds(200), 100))
        .await
        .unwrap();

    engine
        .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
        .await
        .unwrap();

    wait_for_phase(&engine, auction.id, AuctionPhase::Settled, std::time::Duration::from_secs(5)).await;

    let result = engine
        .submit_bid(auction.id, BidderId::new("bob"), Money::from_dollars(500))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::AuctionClosed))
    ));

    let snapshot = engine.auction(auction.id).unwrap();
    assert_eq!(snapshot.highest_bid, Money::from_dollars(150));
    assert_eq!(snapshot.bid_history.len(), 1);
}

#[tokio::test]
async fn late_bid_extends_the_deadline_past_the_original() {
    let engine = AuctionEngine::new(&fast_settings(), Arc::new(SystemClock));

    // Half-second window, one-second grace: an immediate bid lands inside
    // the grace window and pushes the deadline out
    let auction = engine
        .open_auction(listing(Duration::milliseconds(500), 100))
        .await
        .unwrap();

    let committed = engine
        .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
        .await
        .unwrap();
    assert!(committed.deadline_extended);
    assert_eq!(committed.deadline, auction.deadline + Duration::seconds(1));

    // Past the original deadline the auction must still be open
    tokio::time::sleep(std::time::Duration::from_millis(800)).await;
    assert_eq!(engine.auction(auction.id).unwrap().phase, AuctionPhase::Open);

    // And it closes once the extended deadline elapses
    wait_for_phase(&engine, auction.id, AuctionPhase::Settled, std::time::Duration::from_secs(5)).await;

    // A bid arriving after the extended deadline is rejected as closed
    let result = engine
        .submit_bid(auction.id, BidderId::new("bob"), Money::from_dollars(200))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Rejected(RejectReason::AuctionClosed))
    ));
}

#[tokio::test]
async fn force_close_freezes_and_settles_the_last_winner() {
    let engine = AuctionEngine::new(&fast_settings(), Arc::new(SystemClock));
    let auction = engine
        .open_auction(listing(Duration::seconds(60), 100))
        .await
        .unwrap();

    engine
        .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
        .await
        .unwrap();
    engine
        .submit_bid(auction.id, BidderId::new("bob"), Money::from_dollars(175))
        .await
        .unwrap();

    let closed = engine.force_close(auction.id, "admin-1").await.unwrap();
    assert!(closed.phase != AuctionPhase::Open, "force close must leave Open");

    wait_for_phase(&engine, auction.id, AuctionPhase::Settled, std::time::Duration::from_secs(5)).await;

    let records = engine.payment_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].buyer, BidderId::new("bob"));
    assert_eq!(records[0].amount, Money::from_dollars(175));

    // A second force close is refused: the auction already left Open
    let result = engine.force_close(auction.id, "admin-1").await;
    assert!(matches!(result, Err(EngineError::AlreadyClosed(_, _))));
}
