//! The auction engine facade.
//!
//! Wires the registry, the bid desk, the auction clock store, and the
//! settlement ledger into the operation surface the HTTP layer exposes:
//! open an auction, submit a bid, read a snapshot, force-close, checkout,
//! and the administrative queries.

use crate::aggregates::{ClockAction, ClockEnvironment, ClockReducer, ClockState, ClockStore};
use crate::bidding::{BidDesk, BidError};
use crate::config::EngineSettings;
use crate::registry::{AuctionRegistry, CommittedBid, InMemoryAuctionRegistry, RegistryError};
use crate::settlement::{CheckoutError, InMemoryPaymentLedger, PaymentRecorder};
use crate::types::{
    Auction, AuctionId, AuctionPhase, BidderId, Money, PaymentMethod, PaymentRecord, RejectReason,
    SellerId,
};
use chrono::{DateTime, Duration, Utc};
use gavel_core::environment::Clock;
use gavel_runtime::{
    DeadLetterQueue, HealthCheck, HealthReport, RetryPolicy, Store, StoreError,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// How long a synchronous force-close waits for the clock to confirm.
const FORCE_CLOSE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Errors surfaced by engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Unknown auction id
    #[error("Auction not found: {0}")]
    NotFound(AuctionId),

    /// An auction with this id already exists
    #[error("Auction already listed: {0}")]
    AlreadyListed(AuctionId),

    /// Listings must carry a positive starting price
    #[error("Starting price must be greater than zero")]
    InvalidStartingPrice,

    /// The operation requires an open auction
    #[error("Auction {0} is already {1}")]
    AlreadyClosed(AuctionId, AuctionPhase),

    /// No deferred settlement exists for this auction
    #[error("Auction {0} has no pending settlement to deliver")]
    NothingToSettle(AuctionId),

    /// A bid was rejected by a business rule
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    /// Checkout flow failure
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The clock store refused or timed out
    #[error("Engine unavailable: {0}")]
    Unavailable(#[from] StoreError),

    /// An invariant the engine relies on was violated
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl From<RegistryError> for EngineError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound(id) => Self::NotFound(id),
            RegistryError::AlreadyListed(id) => Self::AlreadyListed(id),
            RegistryError::Conflict { .. } => Self::Rejected(RejectReason::Contention),
            RegistryError::ClosedToBids(_) => Self::Rejected(RejectReason::AuctionClosed),
            RegistryError::PhaseConflict {
                auction_id, actual, ..
            } => Self::AlreadyClosed(auction_id, actual),
            RegistryError::InvalidTransition { from, to } => {
                Self::Internal(format!("invalid phase transition {from} -> {to}"))
            },
        }
    }
}

impl From<BidError> for EngineError {
    fn from(error: BidError) -> Self {
        match error {
            BidError::NotFound(id) => Self::NotFound(id),
            BidError::Rejected(reason) => Self::Rejected(reason),
        }
    }
}

/// A new listing handed over by the product/listing collaborator.
#[derive(Clone, Debug)]
pub struct NewListing {
    /// Item name
    pub item_name: String,
    /// Item description
    pub description: String,
    /// Opaque reference to an externally hosted image
    pub image_ref: Option<String>,
    /// Seller identity (validated upstream)
    pub seller: SellerId,
    /// Starting price; must be positive
    pub starting_price: Money,
    /// Bidding window; the engine default applies when absent
    pub duration: Option<Duration>,
}

/// Aggregate counts for the administrative dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct EngineStats {
    /// Total auctions in the registry
    pub auctions: usize,
    /// Auctions currently accepting bids
    pub open: usize,
    /// Auctions closed or closing, not yet settled
    pub closed: usize,
    /// Settled auctions
    pub settled: usize,
    /// Total committed bids across all auctions
    pub bids: usize,
    /// Payment records held by the ledger
    pub payments: usize,
    /// Total recorded revenue in cents
    pub revenue_cents: u64,
    /// Settlements waiting for operator-driven resumption
    pub deferred_settlements: usize,
}

/// The auction bidding engine.
///
/// Cheap to clone across HTTP handlers; all interior state is shared.
#[derive(Clone)]
pub struct AuctionEngine {
    clock: Arc<dyn Clock>,
    registry: Arc<dyn AuctionRegistry>,
    desk: BidDesk,
    ledger: Arc<InMemoryPaymentLedger>,
    clock_store: Arc<ClockStore>,
    dlq: DeadLetterQueue<AuctionId>,
    default_duration: Duration,
}

impl AuctionEngine {
    /// Build an engine with the in-memory ledger as the payment recorder.
    #[must_use]
    pub fn new(settings: &EngineSettings, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(InMemoryPaymentLedger::new(Arc::clone(&clock)));
        Self::with_recorder(settings, clock, Arc::clone(&ledger) as Arc<dyn PaymentRecorder>, ledger)
    }

    /// Build an engine with a custom payment recorder in front of the ledger.
    ///
    /// The recorder receives the finalized-sale deliveries; the ledger backs
    /// the checkout and admin query surfaces. Production passes the ledger
    /// for both; tests interpose fault-injecting recorders.
    #[must_use]
    pub fn with_recorder(
        settings: &EngineSettings,
        clock: Arc<dyn Clock>,
        recorder: Arc<dyn PaymentRecorder>,
        ledger: Arc<InMemoryPaymentLedger>,
    ) -> Self {
        let registry: Arc<dyn AuctionRegistry> = Arc::new(InMemoryAuctionRegistry::new(
            Duration::seconds(settings.grace_window_secs),
        ));

        let desk = BidDesk::new(
            Arc::clone(&registry),
            Arc::clone(&clock),
            settings.bid_attempt_budget,
        );

        let retry = RetryPolicy::new()
            .with_max_attempts(settings.settlement_max_attempts)
            .with_initial_delay(std::time::Duration::from_millis(
                settings.settlement_initial_backoff_ms,
            ))
            .with_max_delay(std::time::Duration::from_secs(
                settings.settlement_max_backoff_secs,
            ));

        let dlq = DeadLetterQueue::new(settings.dlq_capacity);

        let environment = ClockEnvironment::new(
            Arc::clone(&clock),
            Arc::clone(&registry),
            recorder,
            retry,
            dlq.clone(),
        );

        let clock_store = Arc::new(Store::new(
            ClockState::new(),
            ClockReducer::new(),
            environment,
        ));

        Self {
            clock,
            registry,
            desk,
            ledger,
            clock_store,
            dlq,
            default_duration: Duration::seconds(settings.default_auction_duration_secs),
        }
    }

    /// Current server time. Clients observe this; they never decide it.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open an auction for a new listing and arm its clock.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidStartingPrice`] for a zero starting price
    /// - [`EngineError::AlreadyListed`] for a duplicate id
    /// - [`EngineError::Unavailable`] if the clock store is shutting down
    pub async fn open_auction(&self, listing: NewListing) -> Result<Auction, EngineError> {
        if listing.starting_price.is_zero() {
            return Err(EngineError::InvalidStartingPrice);
        }

        let now = self.clock.now();
        let deadline = now + listing.duration.unwrap_or(self.default_duration);
        let auction = Auction::open(
            AuctionId::new(),
            listing.item_name,
            listing.description,
            listing.image_ref,
            listing.seller,
            listing.starting_price,
            now,
            deadline,
        );

        self.registry.insert(auction.clone())?;

        self.clock_store
            .send(ClockAction::ArmDeadline {
                auction_id: auction.id,
                deadline,
            })
            .await?;

        Ok(auction)
    }

    /// Submit a bid.
    ///
    /// On success the committed bid is returned along with the updated highest
    /// bid and (possibly extended) deadline; a grace-window extension re-arms
    /// the auction clock before returning.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for an unknown auction
    /// - [`EngineError::Rejected`] with the validation failure or
    ///   [`RejectReason::Contention`] once the CAS retry budget is exhausted
    pub async fn submit_bid(
        &self,
        auction_id: AuctionId,
        bidder: BidderId,
        amount: Money,
    ) -> Result<CommittedBid, EngineError> {
        let committed = self.desk.submit(auction_id, bidder, amount)?;

        if committed.deadline_extended {
            if let Err(error) = self
                .clock_store
                .send(ClockAction::ExtendDeadline {
                    auction_id,
                    deadline: committed.deadline,
                })
                .await
            {
                tracing::error!(auction_id = %auction_id, %error, "Failed to re-arm extended deadline");
            }
        }

        Ok(committed)
    }

    /// Snapshot a single auction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id.
    pub fn auction(&self, auction_id: AuctionId) -> Result<Auction, EngineError> {
        Ok(self.registry.get(auction_id)?)
    }

    /// Snapshot all auctions, most recently listed first.
    #[must_use]
    pub fn auctions(&self) -> Vec<Auction> {
        self.registry.list()
    }

    /// Force-close an open auction ahead of its deadline (privileged).
    ///
    /// The transition is accepted atomically with whatever bid commit is in
    /// flight: the last bid to win the CAS before the transition lands is
    /// final. Waits for the clock to confirm the closure and returns the
    /// frozen auction.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for an unknown auction
    /// - [`EngineError::AlreadyClosed`] if the auction already left `Open`
    /// - [`EngineError::Unavailable`] if the clock does not confirm in time
    pub async fn force_close(
        &self,
        auction_id: AuctionId,
        actor: &str,
    ) -> Result<Auction, EngineError> {
        let auction = self.registry.get(auction_id)?;
        if auction.phase != AuctionPhase::Open {
            return Err(EngineError::AlreadyClosed(auction_id, auction.phase));
        }

        self.clock_store
            .send_and_wait_for(
                ClockAction::ForceClose {
                    auction_id,
                    actor: actor.to_string(),
                },
                move |action| {
                    matches!(
                        action,
                        ClockAction::AuctionClosed { auction_id: id, .. }
                        | ClockAction::Disarm { auction_id: id }
                        if *id == auction_id
                    )
                },
                FORCE_CLOSE_TIMEOUT,
            )
            .await?;

        Ok(self.registry.get(auction_id)?)
    }

    /// Re-deliver a deferred settlement (operator-driven resumption).
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for an unknown auction
    /// - [`EngineError::NothingToSettle`] if the auction is not a closed sale
    ///   awaiting settlement
    pub async fn retry_settlement(&self, auction_id: AuctionId) -> Result<(), EngineError> {
        let auction = self.registry.get(auction_id)?;

        match auction.phase {
            AuctionPhase::Closed if auction.has_bids() => {
                self.clock_store
                    .send(ClockAction::Settle {
                        auction_id,
                        attempt: 0,
                    })
                    .await?;
                Ok(())
            },
            _ => Err(EngineError::NothingToSettle(auction_id)),
        }
    }

    /// Complete the winner's checkout: attach shipping and payment details to
    /// the recorded sale.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Checkout`] when there is no record, the caller
    /// is not the winner, or checkout already completed.
    pub fn checkout(
        &self,
        auction_id: AuctionId,
        buyer: &BidderId,
        shipping_address: String,
        method: PaymentMethod,
    ) -> Result<PaymentRecord, EngineError> {
        Ok(self
            .ledger
            .attach_checkout(auction_id, buyer, shipping_address, method)?)
    }

    /// All payment records, most recent first (administrative).
    #[must_use]
    pub fn payment_records(&self) -> Vec<PaymentRecord> {
        self.ledger.records()
    }

    /// The payment record for one auction, if any.
    #[must_use]
    pub fn payment_record(&self, auction_id: AuctionId) -> Option<PaymentRecord> {
        self.ledger.record(auction_id)
    }

    /// Remove an auction and release its clock (administrative archival).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id.
    pub async fn remove_auction(&self, auction_id: AuctionId) -> Result<Auction, EngineError> {
        let auction = self.registry.remove(auction_id)?;

        if let Err(error) = self
            .clock_store
            .send(ClockAction::Disarm { auction_id })
            .await
        {
            tracing::warn!(auction_id = %auction_id, %error, "Failed to disarm clock for removed auction");
        }

        Ok(auction)
    }

    /// Aggregate counts for the administrative dashboard.
    pub async fn stats(&self) -> EngineStats {
        let auctions = self.registry.list();
        let records = self.ledger.records();

        let mut open = 0;
        let mut closed = 0;
        let mut settled = 0;
        let mut bids = 0;
        for auction in &auctions {
            match auction.phase {
                AuctionPhase::Open => open += 1,
                AuctionPhase::Closing | AuctionPhase::Closed => closed += 1,
                AuctionPhase::Settled => settled += 1,
            }
            bids += auction.bid_history.len();
        }

        let revenue_cents = records
            .iter()
            .fold(Money::from_cents(0), |acc, r| acc.saturating_add(r.amount))
            .cents();

        let deferred_settlements = self.clock_store.state(ClockState::deferred_count).await;

        EngineStats {
            auctions: auctions.len(),
            open,
            closed,
            settled,
            bids,
            payments: records.len(),
            revenue_cents,
            deferred_settlements,
        }
    }

    /// Health of the engine: clock store plus settlement delivery.
    ///
    /// The deferred count comes from the clock state, the same source
    /// `stats` reads, so health recovers as soon as a deferred settlement is
    /// resumed and acknowledged. The dead letter queue size is reported as
    /// metadata for the audit trail.
    pub async fn health(&self) -> HealthReport {
        let deferred = self.clock_store.state(ClockState::deferred_count).await;
        let settlement_check = if deferred == 0 {
            HealthCheck::healthy("settlement")
        } else {
            HealthCheck::degraded("settlement", format!("{deferred} deferred settlements"))
        }
        .with_metadata("deferred_settlements", deferred.to_string())
        .with_metadata("dlq_size", self.dlq.len().to_string())
        .with_metadata("dlq_capacity", self.dlq.max_size().to_string());

        HealthReport::new(vec![self.clock_store.health(), settlement_check])
    }

    /// Gracefully shut down the clock store, waiting for in-flight effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects outlive the timeout.
    pub async fn shutdown(&self, timeout: std::time::Duration) -> Result<(), StoreError> {
        self.clock_store.shutdown(timeout).await
    }

    /// The clock store, for observers (tests, websockets).
    #[must_use]
    pub fn clock_store(&self) -> Arc<ClockStore> {
        Arc::clone(&self.clock_store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gavel_core::environment::SystemClock;

    fn test_settings() -> EngineSettings {
        EngineSettings {
            default_auction_duration_secs: 3600,
            grace_window_secs: 30,
            bid_attempt_budget: 3,
            settlement_max_attempts: 3,
            settlement_initial_backoff_ms: 10,
            settlement_max_backoff_secs: 1,
            dlq_capacity: 16,
        }
    }

    fn listing(dollars: u64) -> NewListing {
        NewListing {
            item_name: "Vintage camera".to_string(),
            description: "1970s rangefinder".to_string(),
            image_ref: None,
            seller: SellerId::new("seller-1"),
            starting_price: Money::from_dollars(dollars),
            duration: None,
        }
    }

    #[tokio::test]
    async fn open_auction_lists_and_arms_the_clock() {
        let engine = AuctionEngine::new(&test_settings(), Arc::new(SystemClock));

        let auction = engine.open_auction(listing(100)).await.unwrap();

        assert_eq!(auction.phase, AuctionPhase::Open);
        assert_eq!(engine.auctions().len(), 1);

        let armed = engine
            .clock_store()
            .state(|s| s.is_armed(&auction.id))
            .await;
        assert!(armed, "opening an auction must arm its clock");
    }

    #[tokio::test]
    async fn zero_starting_price_is_refused() {
        let engine = AuctionEngine::new(&test_settings(), Arc::new(SystemClock));

        let result = engine
            .open_auction(NewListing {
                starting_price: Money::from_cents(0),
                ..listing(0)
            })
            .await;

        assert!(matches!(result, Err(EngineError::InvalidStartingPrice)));
    }

    #[tokio::test]
    async fn submitted_bid_lands_in_the_snapshot() {
        let engine = AuctionEngine::new(&test_settings(), Arc::new(SystemClock));
        let auction = engine.open_auction(listing(100)).await.unwrap();

        let committed = engine
            .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
            .await
            .unwrap();
        assert_eq!(committed.highest_bid, Money::from_dollars(150));

        let snapshot = engine.auction(auction.id).unwrap();
        assert_eq!(snapshot.highest_bid, Money::from_dollars(150));
        assert_eq!(snapshot.bid_history.len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_listings_and_bids() {
        let engine = AuctionEngine::new(&test_settings(), Arc::new(SystemClock));
        let auction = engine.open_auction(listing(100)).await.unwrap();
        engine
            .submit_bid(auction.id, BidderId::new("alice"), Money::from_dollars(150))
            .await
            .unwrap();

        let stats = engine.stats().await;
        assert_eq!(stats.auctions, 1);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.bids, 1);
        assert_eq!(stats.payments, 0);
    }
}
