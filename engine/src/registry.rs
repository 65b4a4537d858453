//! Auction registry: the authoritative store of auction state.
//!
//! The registry is keyed by auction id and exposes exactly the operations the
//! bidding engine needs: snapshot reads, an atomic compare-and-swap on the
//! highest bid, and a compare-and-swap on the lifecycle phase. The CAS
//! contract is the crux: between two concurrent submissions that both observed
//! the same prior highest bid, at most one wins; the loser receives
//! [`RegistryError::Conflict`] and must re-read state before retrying with a
//! fresh comparison base.
//!
//! Phase transitions go through the same per-map lock as bid commits, so an
//! administrative force-close serializes cleanly with in-flight bids: the last
//! bid to win the CAS before the transition lands is final.

use crate::types::{Auction, AuctionId, AuctionPhase, Bid, Money};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Unknown auction id.
    #[error("Auction not found: {0}")]
    NotFound(AuctionId),

    /// An auction with this id is already listed.
    #[error("Auction already listed: {0}")]
    AlreadyListed(AuctionId),

    /// Optimistic concurrency conflict: the expected highest bid doesn't match
    /// the stored highest bid. Another submission committed first; re-read and
    /// re-validate.
    #[error("Concurrent bid conflict: expected highest bid {expected}, found {actual}")]
    Conflict {
        /// The auction where the conflict occurred
        auction_id: AuctionId,
        /// The highest bid the caller observed
        expected: Money,
        /// The highest bid actually stored
        actual: Money,
    },

    /// The auction no longer accepts bids (phase is not `Open`, or the
    /// deadline has passed).
    #[error("Auction {0} is closed to bidding")]
    ClosedToBids(AuctionId),

    /// The stored phase doesn't match the transition's expected source phase.
    #[error("Phase conflict on auction {auction_id}: expected {expected}, found {actual}")]
    PhaseConflict {
        /// The auction where the conflict occurred
        auction_id: AuctionId,
        /// The phase the caller expected
        expected: AuctionPhase,
        /// The phase actually stored
        actual: AuctionPhase,
    },

    /// The requested transition is not part of the monotonic lifecycle.
    #[error("Invalid phase transition {from} -> {to}")]
    InvalidTransition {
        /// Source phase
        from: AuctionPhase,
        /// Target phase
        to: AuctionPhase,
    },
}

/// A successfully committed bid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedBid {
    /// The bid as appended to the history
    pub bid: Bid,
    /// The new highest bid (equals `bid.amount`)
    pub highest_bid: Money,
    /// The auction deadline after the commit
    pub deadline: DateTime<Utc>,
    /// Whether the commit extended the deadline (grace window fired)
    pub deadline_extended: bool,
}

/// Authoritative store of auction state, keyed by auction id.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; all operations are atomic with
/// respect to each other.
///
/// # Design
///
/// The registry is deliberately minimal. It does NOT validate business rules
/// beyond its own invariants (monotonic phases, strictly increasing history);
/// the bid validator owns rule ordering and rejection reasons.
pub trait AuctionRegistry: Send + Sync {
    /// List a new auction.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyListed`] if the id is taken.
    fn insert(&self, auction: Auction) -> Result<(), RegistryError>;

    /// Read a snapshot of an auction.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown id.
    fn get(&self, id: AuctionId) -> Result<Auction, RegistryError>;

    /// Snapshot all auctions, most recently listed first.
    fn list(&self) -> Vec<Auction>;

    /// Atomically commit a bid if the stored highest bid still equals
    /// `expected`.
    ///
    /// On success the bid is appended to the history, the highest bid and
    /// bidder are updated, and, when the bid landed within the grace window
    /// of the deadline, the deadline is extended in the same critical
    /// section. `bid.placed_at` is the commit time used for the deadline and
    /// grace checks.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`]: unknown auction
    /// - [`RegistryError::ClosedToBids`]: phase is not `Open`, or the deadline
    ///   has passed
    /// - [`RegistryError::Conflict`]: `expected` no longer matches (another
    ///   bid won the race, or the offered amount doesn't beat the stored bid)
    fn compare_and_swap_highest_bid(
        &self,
        id: AuctionId,
        expected: Money,
        bid: Bid,
    ) -> Result<CommittedBid, RegistryError>;

    /// Atomically transition an auction from one phase to the next.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`]: unknown auction
    /// - [`RegistryError::InvalidTransition`]: not a monotonic step
    /// - [`RegistryError::PhaseConflict`]: stored phase is not `from`
    fn transition_phase(
        &self,
        id: AuctionId,
        from: AuctionPhase,
        to: AuctionPhase,
    ) -> Result<(), RegistryError>;

    /// Remove an auction (administrative archival).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown id.
    fn remove(&self, id: AuctionId) -> Result<Auction, RegistryError>;
}

/// In-memory registry backed by a `HashMap` behind an `RwLock`.
///
/// Write operations take the map's write lock for the duration of the check
/// and commit, which is what makes the compare-and-swap atomic. No lock is
/// ever held across an await point or a network call.
#[derive(Debug)]
pub struct InMemoryAuctionRegistry {
    auctions: RwLock<HashMap<AuctionId, Auction>>,
    grace_window: Duration,
}

impl InMemoryAuctionRegistry {
    /// Create a registry with the given anti-snipe grace window.
    ///
    /// A valid bid committed within `grace_window` of the deadline pushes the
    /// deadline out by `grace_window`, preventing last-instant snipe-closing.
    #[must_use]
    pub fn new(grace_window: Duration) -> Self {
        Self {
            auctions: RwLock::new(HashMap::new()),
            grace_window,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AuctionId, Auction>> {
        self.auctions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<AuctionId, Auction>> {
        self.auctions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AuctionRegistry for InMemoryAuctionRegistry {
    fn insert(&self, auction: Auction) -> Result<(), RegistryError> {
        let mut auctions = self.write();

        if auctions.contains_key(&auction.id) {
            return Err(RegistryError::AlreadyListed(auction.id));
        }

        tracing::info!(
            auction_id = %auction.id,
            item = %auction.item_name,
            starting_price = auction.starting_price.cents(),
            deadline = %auction.deadline,
            "Auction listed"
        );
        metrics::counter!("gavel_auctions_listed_total").increment(1);

        auctions.insert(auction.id, auction);
        Ok(())
    }

    fn get(&self, id: AuctionId) -> Result<Auction, RegistryError> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    fn list(&self) -> Vec<Auction> {
        let mut auctions: Vec<Auction> = self.read().values().cloned().collect();
        auctions.sort_by(|a, b| b.listed_at.cmp(&a.listed_at));
        auctions
    }

    fn compare_and_swap_highest_bid(
        &self,
        id: AuctionId,
        expected: Money,
        bid: Bid,
    ) -> Result<CommittedBid, RegistryError> {
        let mut auctions = self.write();
        let auction = auctions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        if !auction.phase.accepts_bids() || bid.placed_at >= auction.deadline {
            return Err(RegistryError::ClosedToBids(id));
        }

        // The optimistic-concurrency check. A stored bid different from the
        // caller's expectation means another submission won the race. An
        // amount that doesn't strictly beat the stored bid is also surfaced
        // as a conflict so the caller re-validates and reports BidTooLow.
        if auction.highest_bid != expected || bid.amount <= auction.highest_bid {
            return Err(RegistryError::Conflict {
                auction_id: id,
                expected,
                actual: auction.highest_bid,
            });
        }

        auction.highest_bid = bid.amount;
        auction.highest_bidder = Some(bid.bidder.clone());
        auction.bid_history.push(bid.clone());

        let deadline_extended = auction.deadline - bid.placed_at <= self.grace_window;
        if deadline_extended {
            auction.deadline += self.grace_window;
            tracing::info!(
                auction_id = %id,
                new_deadline = %auction.deadline,
                "Late bid extended auction deadline"
            );
            metrics::counter!("gavel_deadline_extensions_total").increment(1);
        }

        tracing::debug!(
            auction_id = %id,
            bidder = %bid.bidder,
            amount = bid.amount.cents(),
            "Bid committed"
        );
        metrics::counter!("gavel_bids_committed_total").increment(1);

        Ok(CommittedBid {
            highest_bid: auction.highest_bid,
            deadline: auction.deadline,
            deadline_extended,
            bid,
        })
    }

    fn transition_phase(
        &self,
        id: AuctionId,
        from: AuctionPhase,
        to: AuctionPhase,
    ) -> Result<(), RegistryError> {
        if !from.can_transition_to(to) {
            return Err(RegistryError::InvalidTransition { from, to });
        }

        let mut auctions = self.write();
        let auction = auctions.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        if auction.phase != from {
            return Err(RegistryError::PhaseConflict {
                auction_id: id,
                expected: from,
                actual: auction.phase,
            });
        }

        auction.phase = to;
        tracing::info!(auction_id = %id, from = %from, to = %to, "Auction phase transition");
        Ok(())
    }

    fn remove(&self, id: AuctionId) -> Result<Auction, RegistryError> {
        self.write().remove(&id).ok_or(RegistryError::NotFound(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{BidderId, SellerId};
    use std::sync::Arc;

    fn open_auction(deadline_in: Duration) -> (InMemoryAuctionRegistry, Auction) {
        let registry = InMemoryAuctionRegistry::new(Duration::seconds(30));
        let now = Utc::now();
        let auction = Auction::open(
            AuctionId::new(),
            "Vintage camera".to_string(),
            "1970s rangefinder".to_string(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(100),
            now,
            now + deadline_in,
        );
        registry.insert(auction.clone()).unwrap();
        (registry, auction)
    }

    fn bid(bidder: &str, dollars: u64) -> Bid {
        Bid::new(BidderId::new(bidder), Money::from_dollars(dollars), Utc::now())
    }

    #[test]
    fn cas_commits_when_expectation_matches() {
        let (registry, auction) = open_auction(Duration::hours(1));

        let committed = registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("alice", 150))
            .unwrap();

        assert_eq!(committed.highest_bid, Money::from_dollars(150));
        assert!(!committed.deadline_extended);

        let stored = registry.get(auction.id).unwrap();
        assert_eq!(stored.highest_bid, Money::from_dollars(150));
        assert_eq!(stored.highest_bidder, Some(BidderId::new("alice")));
        assert_eq!(stored.bid_history.len(), 1);
    }

    #[test]
    fn cas_rejects_stale_expectation() {
        let (registry, auction) = open_auction(Duration::hours(1));

        registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("alice", 150))
            .unwrap();

        // Bob still believes the highest bid is the 100 starting price
        let err = registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("bob", 150))
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::Conflict {
                auction_id: auction.id,
                expected: Money::from_dollars(100),
                actual: Money::from_dollars(150),
            }
        );

        // Bob's losing attempt left no trace
        let stored = registry.get(auction.id).unwrap();
        assert_eq!(stored.bid_history.len(), 1);
        assert_eq!(stored.highest_bidder, Some(BidderId::new("alice")));
    }

    #[test]
    fn cas_race_admits_exactly_one_winner_per_observed_base() {
        let (registry, auction) = open_auction(Duration::hours(1));
        let registry = Arc::new(registry);

        // Both threads observed the same 100 base and offer 150
        let handles: Vec<_> = ["alice", "bob"]
            .into_iter()
            .map(|name| {
                let registry = Arc::clone(&registry);
                let id = auction.id;
                std::thread::spawn(move || {
                    registry.compare_and_swap_highest_bid(id, Money::from_dollars(100), bid(name, 150))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(winners, 1, "exactly one of two racing bids must commit");
        assert_eq!(registry.get(auction.id).unwrap().bid_history.len(), 1);
    }

    #[test]
    fn cas_refused_once_auction_leaves_open() {
        let (registry, auction) = open_auction(Duration::hours(1));

        registry
            .transition_phase(auction.id, AuctionPhase::Open, AuctionPhase::Closing)
            .unwrap();

        let err = registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("alice", 150))
            .unwrap_err();

        assert_eq!(err, RegistryError::ClosedToBids(auction.id));
    }

    #[test]
    fn cas_refused_past_deadline_even_while_open() {
        let (registry, auction) = open_auction(Duration::milliseconds(-1));

        let err = registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("alice", 150))
            .unwrap_err();

        assert_eq!(err, RegistryError::ClosedToBids(auction.id));
    }

    #[test]
    fn late_bid_extends_deadline_by_grace_window() {
        let registry = InMemoryAuctionRegistry::new(Duration::seconds(30));
        let now = Utc::now();
        let deadline = now + Duration::seconds(2);
        let auction = Auction::open(
            AuctionId::new(),
            "Clock".to_string(),
            String::new(),
            None,
            SellerId::new("seller-1"),
            Money::from_dollars(10),
            now,
            deadline,
        );
        registry.insert(auction.clone()).unwrap();

        // Bid lands 2 seconds before the deadline, inside the 30s grace window
        let committed = registry
            .compare_and_swap_highest_bid(
                auction.id,
                Money::from_dollars(10),
                Bid::new(BidderId::new("alice"), Money::from_dollars(20), now),
            )
            .unwrap();

        assert!(committed.deadline_extended);
        assert_eq!(committed.deadline, deadline + Duration::seconds(30));
    }

    #[test]
    fn early_bid_leaves_deadline_alone() {
        let (registry, auction) = open_auction(Duration::hours(1));

        let committed = registry
            .compare_and_swap_highest_bid(auction.id, Money::from_dollars(100), bid("alice", 150))
            .unwrap();

        assert!(!committed.deadline_extended);
        assert_eq!(committed.deadline, auction.deadline);
    }

    #[test]
    fn phase_transitions_reject_non_monotonic_steps() {
        let (registry, auction) = open_auction(Duration::hours(1));

        assert_eq!(
            registry
                .transition_phase(auction.id, AuctionPhase::Open, AuctionPhase::Closed)
                .unwrap_err(),
            RegistryError::InvalidTransition {
                from: AuctionPhase::Open,
                to: AuctionPhase::Closed,
            }
        );

        registry
            .transition_phase(auction.id, AuctionPhase::Open, AuctionPhase::Closing)
            .unwrap();

        // Stale transition from Open loses to the one that already landed
        assert_eq!(
            registry
                .transition_phase(auction.id, AuctionPhase::Open, AuctionPhase::Closing)
                .unwrap_err(),
            RegistryError::PhaseConflict {
                auction_id: auction.id,
                expected: AuctionPhase::Open,
                actual: AuctionPhase::Closing,
            }
        );
    }

    #[test]
    fn duplicate_listing_is_refused() {
        let (registry, auction) = open_auction(Duration::hours(1));
        assert_eq!(
            registry.insert(auction.clone()).unwrap_err(),
            RegistryError::AlreadyListed(auction.id)
        );
    }

    #[test]
    fn list_orders_by_recency() {
        let registry = InMemoryAuctionRegistry::new(Duration::seconds(30));
        let now = Utc::now();

        for (name, listed_at) in [("older", now - Duration::hours(2)), ("newer", now)] {
            registry
                .insert(Auction::open(
                    AuctionId::new(),
                    name.to_string(),
                    String::new(),
                    None,
                    SellerId::new("seller-1"),
                    Money::from_dollars(10),
                    listed_at,
                    now + Duration::hours(1),
                ))
                .unwrap();
        }

        let listed = registry.list();
        assert_eq!(listed[0].item_name, "newer");
        assert_eq!(listed[1].item_name, "older");
    }
}
