//! Property tests for bid acceptance.
//!
//! For any sequence of submissions, the registry must accept exactly the bids
//! that strictly raise the highest bid, keep the history strictly increasing,
//! and finish with the highest bid equal to the maximum accepted amount.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use gavel::{
    Auction, AuctionId, AuctionRegistry, BidDesk, BidError, BidderId, InMemoryAuctionRegistry,
    Money, RejectReason, SellerId,
};
use gavel_core::environment::SystemClock;
use proptest::prelude::*;
use std::sync::Arc;

const STARTING_CENTS: u64 = 100;

fn desk_with_auction() -> (BidDesk, Arc<InMemoryAuctionRegistry>, AuctionId) {
    let registry = Arc::new(InMemoryAuctionRegistry::new(Duration::zero()));
    let now = Utc::now();
    let auction = Auction::open(
        AuctionId::new(),
        "Property lot".to_string(),
        String::new(),
        None,
        SellerId::new("seller-1"),
        Money::from_cents(STARTING_CENTS),
        now,
        now + Duration::hours(1),
    );
    let id = auction.id;
    registry.insert(auction).unwrap();

    let desk = BidDesk::new(registry.clone(), Arc::new(SystemClock), 3);
    (desk, registry, id)
}

proptest! {
    #[test]
    fn sequential_submissions_accept_exactly_the_raising_bids(
        amounts in proptest::collection::vec(1u64..1000, 1..50)
    ) {
        let (desk, registry, auction_id) = desk_with_auction();

        let mut current = STARTING_CENTS;
        let mut accepted = Vec::new();

        for (i, cents) in amounts.iter().copied().enumerate() {
            let result = desk.submit(
                auction_id,
                BidderId::new(format!("bidder-{i}")),
                Money::from_cents(cents),
            );

            if cents > current {
                prop_assert!(result.is_ok(), "raising bid {cents} over {current} must be accepted");
                current = cents;
                accepted.push(cents);
            } else {
                prop_assert_eq!(
                    result.unwrap_err(),
                    BidError::Rejected(RejectReason::BidTooLow {
                        current: Money::from_cents(current)
                    })
                );
            }
        }

        let snapshot = registry.get(auction_id).unwrap();
        let history: Vec<u64> = snapshot.bid_history.iter().map(|b| b.amount.cents()).collect();

        // The history is exactly the accepted sequence, strictly increasing
        prop_assert_eq!(&history, &accepted);
        prop_assert!(history.windows(2).all(|w| w[0] < w[1]));

        // The final highest bid is the maximum accepted amount, or the
        // starting price when nothing was accepted
        let expected_highest = accepted.last().copied().unwrap_or(STARTING_CENTS);
        prop_assert_eq!(snapshot.highest_bid.cents(), expected_highest);
        prop_assert_eq!(snapshot.highest_bidder.is_none(), accepted.is_empty());
    }
}
