//! Bid validation and the commit path.
//!
//! [`validate`] is the pure rule check; [`BidDesk`] turns an accepted
//! validation into a durable state change through the registry's
//! compare-and-swap, re-reading and re-validating on conflict up to a bounded
//! attempt budget.

use crate::registry::{AuctionRegistry, CommittedBid, RegistryError};
use crate::types::{Auction, AuctionId, Bid, BidderId, Money, RejectReason};
use chrono::{DateTime, Utc};
use gavel_core::environment::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by bid submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidError {
    /// Unknown auction id. Reported to the caller, never retried.
    #[error("Auction not found: {0}")]
    NotFound(AuctionId),

    /// The bid was rejected by a business rule.
    #[error(transparent)]
    Rejected(#[from] RejectReason),
}

/// Validate a proposed bid against an auction snapshot.
///
/// Pure function with no side effects; rules are checked in order:
///
/// 1. the auction is `Open` and `now` is before the deadline, else
///    [`RejectReason::AuctionClosed`];
/// 2. the amount strictly exceeds the current highest bid (ties rejected),
///    else [`RejectReason::BidTooLow`];
/// 3. the bidder identity is well-formed and non-empty, else
///    [`RejectReason::InvalidBidder`].
///
/// Callers must re-validate against fresh state if a commit conflict occurs.
///
/// # Errors
///
/// Returns the first violated rule's [`RejectReason`].
pub fn validate(
    auction: &Auction,
    bidder: &BidderId,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<(), RejectReason> {
    if !auction.phase.accepts_bids() || now >= auction.deadline {
        return Err(RejectReason::AuctionClosed);
    }

    if amount <= auction.highest_bid {
        return Err(RejectReason::BidTooLow {
            current: auction.highest_bid,
        });
    }

    if !bidder.is_well_formed() {
        return Err(RejectReason::InvalidBidder);
    }

    Ok(())
}

/// The bid applier: turns an accepted validation into a committed bid.
///
/// Algorithm: read the current auction snapshot, validate, then attempt the
/// registry compare-and-swap with the snapshot's highest bid as the
/// expectation. On [`RegistryError::Conflict`] the snapshot is re-fetched and
/// the validation re-run, up to `attempt_budget` attempts before surfacing
/// [`RejectReason::Contention`]. No lock is held between the read and the
/// commit; losers of a race never block winners.
#[derive(Clone)]
pub struct BidDesk {
    registry: Arc<dyn AuctionRegistry>,
    clock: Arc<dyn Clock>,
    attempt_budget: u32,
}

impl BidDesk {
    /// Create a bid desk over a registry with the given CAS attempt budget.
    #[must_use]
    pub fn new(registry: Arc<dyn AuctionRegistry>, clock: Arc<dyn Clock>, attempt_budget: u32) -> Self {
        Self {
            registry,
            clock,
            attempt_budget: attempt_budget.max(1),
        }
    }

    /// Submit a bid.
    ///
    /// Returns the committed bid together with the updated highest bid and the
    /// (possibly extended) deadline.
    ///
    /// # Errors
    ///
    /// - [`BidError::NotFound`] for an unknown auction
    /// - [`BidError::Rejected`] with the validation failure, or
    ///   [`RejectReason::Contention`] once the attempt budget is exhausted
    pub fn submit(
        &self,
        auction_id: AuctionId,
        bidder: BidderId,
        amount: Money,
    ) -> Result<CommittedBid, BidError> {
        for attempt in 0..self.attempt_budget {
            let snapshot = match self.registry.get(auction_id) {
                Ok(auction) => auction,
                Err(_) => return Err(BidError::NotFound(auction_id)),
            };

            let now = self.clock.now();
            validate(&snapshot, &bidder, amount, now)?;

            let bid = Bid::new(bidder.clone(), amount, now);
            match self
                .registry
                .compare_and_swap_highest_bid(auction_id, snapshot.highest_bid, bid)
            {
                Ok(committed) => {
                    metrics::counter!("gavel_bids_accepted_total").increment(1);
                    metrics::histogram!("gavel_bid_commit_attempts").record(f64::from(attempt + 1));
                    return Ok(committed);
                },
                Err(RegistryError::Conflict { actual, .. }) => {
                    tracing::debug!(
                        auction_id = %auction_id,
                        attempt,
                        observed = snapshot.highest_bid.cents(),
                        actual = actual.cents(),
                        "Bid commit conflict, re-validating against fresh state"
                    );
                    metrics::counter!("gavel_bid_conflicts_total").increment(1);
                },
                Err(RegistryError::ClosedToBids(_)) => {
                    return Err(RejectReason::AuctionClosed.into());
                },
                Err(RegistryError::NotFound(id)) => return Err(BidError::NotFound(id)),
                Err(error) => {
                    // insert/transition errors cannot come out of the bid CAS
                    tracing::error!(auction_id = %auction_id, %error, "Unexpected registry error");
                    return Err(RejectReason::Contention.into());
                },
            }
        }

        metrics::counter!("gavel_bids_contended_total").increment(1);
        Err(RejectReason::Contention.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::InMemoryAuctionRegistry;
    use crate::types::{AuctionPhase, SellerId};
    use chrono::Duration;
    use gavel_core::environment::SystemClock;

    fn listed_auction(registry: &InMemoryAuctionRegistry) -> Auction {
        let now = Utc::now();
        let auction = Auction::open(
            AuctionId::new(),
            "Vintage camera".to_string(),
            "1970s rangefinder".to_string(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + Duration::hours(1),
        );
        registry.insert(auction.clone()).unwrap();
        auction
    }

    fn desk(registry: Arc<dyn AuctionRegistry>) -> BidDesk {
        BidDesk::new(registry, Arc::new(SystemClock), 3)
    }

    #[test]
    fn validation_rules_check_in_order() {
        let now = Utc::now();
        let mut auction = Auction::open(
            AuctionId::new(),
            "Clock".to_string(),
            String::new(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + Duration::hours(1),
        );

        // Rule 2 fires before rule 3: a too-low bid from a blank bidder
        // reports BidTooLow
        assert_eq!(
            validate(&auction, &BidderId::new(""), Money::from_dollars(50), now),
            Err(RejectReason::BidTooLow {
                current: Money::from_dollars(100)
            })
        );

        // Rule 3: amount fine, bidder blank
        assert_eq!(
            validate(&auction, &BidderId::new("  "), Money::from_dollars(150), now),
            Err(RejectReason::InvalidBidder)
        );

        // Rule 1 fires first once the auction leaves Open
        auction.phase = AuctionPhase::Closing;
        assert_eq!(
            validate(&auction, &BidderId::new(""), Money::from_dollars(50), now),
            Err(RejectReason::AuctionClosed)
        );
    }

    #[test]
    fn ties_are_rejected() {
        let now = Utc::now();
        let auction = Auction::open(
            AuctionId::new(),
            "Clock".to_string(),
            String::new(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + Duration::hours(1),
        );

        assert_eq!(
            validate(&auction, &BidderId::new("alice"), Money::from_dollars(100), now),
            Err(RejectReason::BidTooLow {
                current: Money::from_dollars(100)
            })
        );
    }

    #[test]
    fn past_deadline_rejects_as_closed() {
        let now = Utc::now();
        let auction = Auction::open(
            AuctionId::new(),
            "Clock".to_string(),
            String::new(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + Duration::hours(1),
        );

        assert_eq!(
            validate(
                &auction,
                &BidderId::new("alice"),
                Money::from_dollars(150),
                now + Duration::hours(2)
            ),
            Err(RejectReason::AuctionClosed)
        );
    }

    #[test]
    fn accepted_then_stale_then_higher() {
        // The walkthrough from the design notes: start 100, A=150 accepted,
        // B=150 against stale state rejected as too low, C=200 accepted.
        let registry = Arc::new(InMemoryAuctionRegistry::new(Duration::seconds(30)));
        let auction = listed_auction(&registry);
        let desk = desk(registry.clone());

        let a = desk
            .submit(auction.id, BidderId::new("alice"), Money::from_dollars(150))
            .unwrap();
        assert_eq!(a.highest_bid, Money::from_dollars(150));

        let b = desk
            .submit(auction.id, BidderId::new("bob"), Money::from_dollars(150))
            .unwrap_err();
        assert_eq!(
            b,
            BidError::Rejected(RejectReason::BidTooLow {
                current: Money::from_dollars(150)
            })
        );

        let c = desk
            .submit(auction.id, BidderId::new("carol"), Money::from_dollars(200))
            .unwrap();
        assert_eq!(c.highest_bid, Money::from_dollars(200));

        let stored = registry.get(auction.id).unwrap();
        assert_eq!(stored.bid_history.len(), 2);
        assert_eq!(stored.highest_bidder, Some(BidderId::new("carol")));
    }

    #[test]
    fn desk_rejects_once_the_clock_passes_the_deadline() {
        use gavel_testing::mocks::ManualClock;

        let registry = Arc::new(InMemoryAuctionRegistry::new(Duration::seconds(30)));
        let auction = listed_auction(&registry);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let desk = BidDesk::new(registry.clone(), clock.clone(), 3);

        desk.submit(auction.id, BidderId::new("alice"), Money::from_dollars(150))
            .unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(
            desk.submit(auction.id, BidderId::new("bob"), Money::from_dollars(200))
                .unwrap_err(),
            BidError::Rejected(RejectReason::AuctionClosed)
        );
    }

    #[test]
    fn unknown_auction_reports_not_found() {
        let registry = Arc::new(InMemoryAuctionRegistry::new(Duration::seconds(30)));
        let desk = desk(registry);
        let missing = AuctionId::new();

        assert_eq!(
            desk.submit(missing, BidderId::new("alice"), Money::from_dollars(10))
                .unwrap_err(),
            BidError::NotFound(missing)
        );
    }

    #[test]
    fn exhausted_conflicts_surface_contention() {
        // A registry that always reports a conflict with a *lower* stored bid
        // keeps validation passing, forcing the desk through its full budget.
        struct AlwaysConflicting {
            auction: Auction,
        }

        impl AuctionRegistry for AlwaysConflicting {
            fn insert(&self, _auction: Auction) -> Result<(), RegistryError> {
                Ok(())
            }

            fn get(&self, _id: AuctionId) -> Result<Auction, RegistryError> {
                Ok(self.auction.clone())
            }

            fn list(&self) -> Vec<Auction> {
                vec![self.auction.clone()]
            }

            fn compare_and_swap_highest_bid(
                &self,
                id: AuctionId,
                expected: Money,
                _bid: Bid,
            ) -> Result<CommittedBid, RegistryError> {
                Err(RegistryError::Conflict {
                    auction_id: id,
                    expected,
                    actual: self.auction.highest_bid,
                })
            }

            fn transition_phase(
                &self,
                _id: AuctionId,
                _from: AuctionPhase,
                _to: AuctionPhase,
            ) -> Result<(), RegistryError> {
                Ok(())
            }

            fn remove(&self, _id: AuctionId) -> Result<Auction, RegistryError> {
                Ok(self.auction.clone())
            }
        }

        let now = Utc::now();
        let auction = Auction::open(
            AuctionId::new(),
            "Contended".to_string(),
            String::new(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + Duration::hours(1),
        );
        let desk = BidDesk::new(
            Arc::new(AlwaysConflicting {
                auction: auction.clone(),
            }),
            Arc::new(SystemClock),
            3,
        );

        assert_eq!(
            desk.submit(auction.id, BidderId::new("alice"), Money::from_dollars(150))
                .unwrap_err(),
            BidError::Rejected(RejectReason::Contention)
        );
    }

    #[test]
    fn concurrent_submissions_keep_history_strictly_increasing() {
        let registry = Arc::new(InMemoryAuctionRegistry::new(Duration::seconds(30)));
        let auction = listed_auction(&registry);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let desk = desk(registry.clone());
                let id = auction.id;
                std::thread::spawn(move || {
                    // Overlapping amounts force conflicts and rejections
                    for dollars in [110 + i, 150, 200 + i] {
                        let _ = desk.submit(id, BidderId::new(format!("bidder-{i}")), Money::from_dollars(dollars));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stored = registry.get(auction.id).unwrap();
        let amounts: Vec<u64> = stored.bid_history.iter().map(|b| b.amount.cents()).collect();

        assert!(
            amounts.windows(2).all(|w| w[0] < w[1]),
            "bid history must be strictly increasing: {amounts:?}"
        );
        assert_eq!(
            stored.highest_bid.cents(),
            *amounts.last().unwrap(),
            "highest bid tracks the last committed bid"
        );
    }
}
