//! The auction clock: server-owned lifecycle state machine.
//!
//! Drives each auction through `Open → Closing → Closed → Settled` from
//! server-side wall-clock scheduling. Clients only poll and observe state;
//! they never decide closure.
//!
//! One clock entry per auction id is the ownership rule: the entry is acquired
//! once when the auction opens, duplicate arming is refused, and the entry is
//! released at `Settled` (or at `Closed` for auctions that drew no bids).
//! Deadline timers are `Effect::Delay` actions carrying a generation counter;
//! a grace-window extension bumps the generation so a superseded timer is
//! ignored when it fires.
//!
//! Settlement delivery is retried with backoff as delayed actions. Once the
//! attempt budget is exhausted the auction id lands in the dead letter queue
//! and the auction stays `Closed` (not `Settled`), observable and resumable.

use crate::registry::{AuctionRegistry, RegistryError};
use crate::settlement::PaymentRecorder;
use crate::types::{AuctionId, AuctionPhase, Bid};
use chrono::{DateTime, Utc};
use gavel_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use gavel_runtime::{DeadLetterQueue, RetryPolicy, Store};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the auction clock.
#[derive(Clone, Debug, PartialEq)]
pub enum ClockAction {
    // Commands
    /// Acquire clock ownership for a newly opened auction and start its timer
    ArmDeadline {
        /// Auction to track
        auction_id: AuctionId,
        /// Absolute close time
        deadline: DateTime<Utc>,
    },

    /// Move the deadline (grace-window extension); supersedes the old timer
    ExtendDeadline {
        /// Auction whose deadline moved
        auction_id: AuctionId,
        /// The new absolute close time
        deadline: DateTime<Utc>,
    },

    /// Administrative early close, regardless of the deadline
    ForceClose {
        /// Auction to close
        auction_id: AuctionId,
        /// Administrator requesting the close
        actor: String,
    },

    /// A deadline timer fired
    DeadlineElapsed {
        /// Auction whose timer fired
        auction_id: AuctionId,
        /// Timer generation; stale generations are ignored
        generation: u64,
    },

    /// Deliver (or re-deliver) the finalized sale to the payment recorder
    Settle {
        /// Auction to settle
        auction_id: AuctionId,
        /// Zero-indexed delivery attempt
        attempt: u32,
    },

    /// Release clock ownership without settling (auction gone or no sale)
    Disarm {
        /// Auction to release
        auction_id: AuctionId,
    },

    // Events
    /// The auction was frozen and finalized
    AuctionClosed {
        /// Auction that closed
        auction_id: AuctionId,
        /// The final bid, `None` when no bid was ever placed
        winning_bid: Option<Bid>,
    },

    /// The payment recorder acknowledged the sale
    SettlementRecorded {
        /// Auction that settled
        auction_id: AuctionId,
    },

    /// A settlement delivery attempt failed
    SettlementFailed {
        /// Auction whose delivery failed
        auction_id: AuctionId,
        /// The attempt that failed (zero-indexed)
        attempt: u32,
        /// Collaborator error message
        error: String,
    },
}

// ============================================================================
// State
// ============================================================================

/// Settlement progress for a closed auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementProgress {
    /// Auction still open, nothing to settle yet
    NotStarted,
    /// A delivery attempt is scheduled or in flight
    InFlight {
        /// Zero-indexed attempt number
        attempt: u32,
    },
    /// Retry budget exhausted; waiting for operator-driven resumption
    Deferred,
}

/// Per-auction clock ownership entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockEntry {
    /// Absolute close time this clock is counting down to
    pub deadline: DateTime<Utc>,
    /// Timer generation; bumped on every extension
    pub generation: u64,
    /// Settlement progress once the auction has closed
    pub settlement: SettlementProgress,
}

/// State for the auction clock: one entry per auction with an active clock.
#[derive(Clone, Debug, Default)]
pub struct ClockState {
    /// Active clock entries keyed by auction id
    pub entries: HashMap<AuctionId, ClockEntry>,
}

impl ClockState {
    /// Creates a new empty `ClockState`
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Whether a clock is armed for this auction
    #[must_use]
    pub fn is_armed(&self, id: &AuctionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Gets the clock entry for an auction
    #[must_use]
    pub fn get(&self, id: &AuctionId) -> Option<&ClockEntry> {
        self.entries.get(id)
    }

    /// Number of active clocks
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Number of settlements deferred to the dead letter queue
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.settlement == SettlementProgress::Deferred)
            .count()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the auction clock.
#[derive(Clone)]
pub struct ClockEnvironment {
    /// Wall clock (server-owned source of truth for closing time)
    pub clock: Arc<dyn Clock>,
    /// Auction registry for phase transitions and final snapshots
    pub registry: Arc<dyn AuctionRegistry>,
    /// Payment-recording collaborator
    pub payments: Arc<dyn PaymentRecorder>,
    /// Backoff schedule for settlement delivery retries
    pub retry: RetryPolicy,
    /// Where exhausted settlement deliveries are surfaced
    pub dlq: DeadLetterQueue<AuctionId>,
}

impl ClockEnvironment {
    /// Creates a new `ClockEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        registry: Arc<dyn AuctionRegistry>,
        payments: Arc<dyn PaymentRecorder>,
        retry: RetryPolicy,
        dlq: DeadLetterQueue<AuctionId>,
    ) -> Self {
        Self {
            clock,
            registry,
            payments,
            retry,
            dlq,
        }
    }
}

/// The store type driving the auction clock.
pub type ClockStore = Store<ClockState, ClockAction, ClockEnvironment, ClockReducer>;

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the auction clock.
#[derive(Clone, Debug, Default)]
pub struct ClockReducer;

impl ClockReducer {
    /// Creates a new `ClockReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Timer effect firing `DeadlineElapsed` at `deadline`.
    fn timer_effect(
        env: &ClockEnvironment,
        auction_id: AuctionId,
        deadline: DateTime<Utc>,
        generation: u64,
    ) -> Effect<ClockAction> {
        let duration = (deadline - env.clock.now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        Effect::Delay {
            duration,
            action: Box::new(ClockAction::DeadlineElapsed {
                auction_id,
                generation,
            }),
        }
    }

    /// Close effect: freeze bids, finalize the winner, report the closure.
    ///
    /// `enforce_deadline` is set for timer-driven closes: a bid inside the
    /// grace window may have moved the registry deadline after this timer was
    /// armed, in which case the clock re-arms instead of closing.
    fn close_effect(
        env: &ClockEnvironment,
        auction_id: AuctionId,
        enforce_deadline: bool,
    ) -> Effect<ClockAction> {
        let registry = Arc::clone(&env.registry);
        let clock = Arc::clone(&env.clock);

        Effect::Future(Box::pin(async move {
            let Ok(snapshot) = registry.get(auction_id) else {
                return Some(ClockAction::Disarm { auction_id });
            };

            if enforce_deadline && clock.now() < snapshot.deadline {
                return Some(ClockAction::ExtendDeadline {
                    auction_id,
                    deadline: snapshot.deadline,
                });
            }

            match registry.transition_phase(auction_id, AuctionPhase::Open, AuctionPhase::Closing) {
                Ok(()) => {},
                // Another closer (force-close vs timer) already landed
                Err(RegistryError::PhaseConflict { .. }) => return None,
                Err(_) => return Some(ClockAction::Disarm { auction_id }),
            }

            // Phase left Open: highest_bid and highest_bidder are frozen now
            let Ok(snapshot) = registry.get(auction_id) else {
                return Some(ClockAction::Disarm { auction_id });
            };

            if let Err(error) =
                registry.transition_phase(auction_id, AuctionPhase::Closing, AuctionPhase::Closed)
            {
                tracing::error!(auction_id = %auction_id, %error, "Failed to finalize close");
            }

            metrics::counter!("gavel_auctions_closed_total").increment(1);
            tracing::info!(
                auction_id = %auction_id,
                winning_bid = snapshot.bid_history.last().map(|b| b.amount.cents()),
                "Auction closed"
            );

            Some(ClockAction::AuctionClosed {
                auction_id,
                winning_bid: snapshot.bid_history.last().cloned(),
            })
        }))
    }

    /// Settlement delivery effect for a closed auction.
    fn settle_effect(
        env: &ClockEnvironment,
        auction_id: AuctionId,
        attempt: u32,
    ) -> Effect<ClockAction> {
        let registry = Arc::clone(&env.registry);
        let payments = Arc::clone(&env.payments);

        Effect::Future(Box::pin(async move {
            let Ok(snapshot) = registry.get(auction_id) else {
                return Some(ClockAction::Disarm { auction_id });
            };

            match (snapshot.phase, snapshot.highest_bidder.clone()) {
                (AuctionPhase::Closed, Some(buyer)) => {
                    match payments
                        .finalize_sale(auction_id, buyer, snapshot.highest_bid)
                        .await
                    {
                        Ok(outcome) => {
                            tracing::debug!(auction_id = %auction_id, ?outcome, "Sale delivery acknowledged");
                            if let Err(error) = registry.transition_phase(
                                auction_id,
                                AuctionPhase::Closed,
                                AuctionPhase::Settled,
                            ) {
                                tracing::error!(auction_id = %auction_id, %error, "Failed to mark auction settled");
                            }
                            Some(ClockAction::SettlementRecorded { auction_id })
                        },
                        Err(error) => Some(ClockAction::SettlementFailed {
                            auction_id,
                            attempt,
                            error: error.to_string(),
                        }),
                    }
                },
                // A duplicate delivery raced a completed one
                (AuctionPhase::Settled, _) => Some(ClockAction::SettlementRecorded { auction_id }),
                // Nothing to settle (no sale, or auction not yet closed)
                _ => Some(ClockAction::Disarm { auction_id }),
            }
        }))
    }
}

impl Reducer for ClockReducer {
    type State = ClockState;
    type Action = ClockAction;
    type Environment = ClockEnvironment;

    #[allow(clippy::too_many_lines)] // Lifecycle orchestration is one state machine
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ClockAction::ArmDeadline {
                auction_id,
                deadline,
            } => {
                // Ownership is acquired once; a second clock for the same
                // auction risks double-settlement
                if state.is_armed(&auction_id) {
                    tracing::warn!(auction_id = %auction_id, "Clock already armed, refusing duplicate");
                    return SmallVec::new();
                }

                state.entries.insert(
                    auction_id,
                    ClockEntry {
                        deadline,
                        generation: 0,
                        settlement: SettlementProgress::NotStarted,
                    },
                );

                tracing::info!(auction_id = %auction_id, %deadline, "Auction clock armed");
                smallvec![Self::timer_effect(env, auction_id, deadline, 0)]
            },

            ClockAction::ExtendDeadline {
                auction_id,
                deadline,
            } => {
                let Some(entry) = state.entries.get_mut(&auction_id) else {
                    tracing::warn!(auction_id = %auction_id, "Deadline extension for unarmed clock, ignoring");
                    return SmallVec::new();
                };

                entry.generation += 1;
                entry.deadline = deadline;
                let generation = entry.generation;

                tracing::info!(
                    auction_id = %auction_id,
                    %deadline,
                    generation,
                    "Deadline extended, timer re-armed"
                );
                smallvec![Self::timer_effect(env, auction_id, deadline, generation)]
            },

            ClockAction::DeadlineElapsed {
                auction_id,
                generation,
            } => {
                let Some(entry) = state.entries.get(&auction_id) else {
                    return SmallVec::new();
                };

                if entry.generation != generation {
                    metrics::counter!("gavel_stale_timers_total").increment(1);
                    tracing::debug!(
                        auction_id = %auction_id,
                        fired = generation,
                        current = entry.generation,
                        "Superseded timer fired, ignoring"
                    );
                    return SmallVec::new();
                }

                smallvec![Self::close_effect(env, auction_id, true)]
            },

            ClockAction::ForceClose { auction_id, actor } => {
                if !state.is_armed(&auction_id) {
                    tracing::warn!(auction_id = %auction_id, actor, "Force close for unarmed auction, ignoring");
                    return SmallVec::new();
                }

                tracing::info!(auction_id = %auction_id, actor, "Administrative force close");
                metrics::counter!("gavel_force_closes_total").increment(1);
                smallvec![Self::close_effect(env, auction_id, false)]
            },

            ClockAction::AuctionClosed {
                auction_id,
                winning_bid,
            } => match winning_bid {
                Some(bid) => {
                    if let Some(entry) = state.entries.get_mut(&auction_id) {
                        entry.settlement = SettlementProgress::InFlight { attempt: 0 };
                    }

                    tracing::info!(
                        auction_id = %auction_id,
                        buyer = %bid.bidder,
                        amount = bid.amount.cents(),
                        "Winner finalized, starting settlement"
                    );
                    smallvec![Self::settle_effect(env, auction_id, 0)]
                },
                None => {
                    // No sale: settlement skipped, ownership released at Closed
                    state.entries.remove(&auction_id);
                    metrics::counter!("gavel_auctions_unsold_total").increment(1);
                    tracing::info!(auction_id = %auction_id, "Auction closed without bids, no settlement");
                    SmallVec::new()
                },
            },

            ClockAction::Settle {
                auction_id,
                attempt,
            } => {
                if let Some(entry) = state.entries.get_mut(&auction_id) {
                    entry.settlement = SettlementProgress::InFlight { attempt };
                }
                smallvec![Self::settle_effect(env, auction_id, attempt)]
            },

            ClockAction::SettlementFailed {
                auction_id,
                attempt,
                error,
            } => {
                let next = attempt + 1;
                if env.retry.should_retry(next) {
                    if let Some(entry) = state.entries.get_mut(&auction_id) {
                        entry.settlement = SettlementProgress::InFlight { attempt: next };
                    }

                    let backoff = env.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        auction_id = %auction_id,
                        attempt,
                        backoff_ms = backoff.as_millis(),
                        error,
                        "Settlement delivery failed, retrying"
                    );
                    smallvec![Effect::Delay {
                        duration: backoff,
                        action: Box::new(ClockAction::Settle {
                            auction_id,
                            attempt: next,
                        }),
                    }]
                } else {
                    if let Some(entry) = state.entries.get_mut(&auction_id) {
                        entry.settlement = SettlementProgress::Deferred;
                    }

                    // One live audit entry per auction: a re-deferral after an
                    // operator resume replaces the stale record
                    env.dlq.remove(&auction_id);
                    env.dlq.push(auction_id, error.clone(), next as usize);
                    metrics::counter!("gavel_settlements_deferred_total").increment(1);
                    tracing::error!(
                        auction_id = %auction_id,
                        attempts = next,
                        error,
                        "Settlement retries exhausted; auction stays closed until resumed"
                    );
                    SmallVec::new()
                }
            },

            ClockAction::SettlementRecorded { auction_id } => {
                // Ownership released at Settled; a resolved deferral no
                // longer belongs in the alerting queue
                state.entries.remove(&auction_id);
                env.dlq.remove(&auction_id);
                metrics::counter!("gavel_auctions_settled_total").increment(1);
                tracing::info!(auction_id = %auction_id, "Auction settled");
                SmallVec::new()
            },

            ClockAction::Disarm { auction_id } => {
                state.entries.remove(&auction_id);
                env.dlq.remove(&auction_id);
                tracing::debug!(auction_id = %auction_id, "Clock disarmed");
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::InMemoryAuctionRegistry;
    use crate::settlement::InMemoryPaymentLedger;
    use crate::types::{BidderId, Money};
    use chrono::Duration;
    use gavel_testing::{ReducerTest, assertions, mocks::test_instant};

    fn test_env() -> ClockEnvironment {
        let clock = Arc::new(gavel_testing::mocks::test_clock());
        ClockEnvironment::new(
            clock.clone(),
            Arc::new(InMemoryAuctionRegistry::new(Duration::seconds(30))),
            Arc::new(InMemoryPaymentLedger::new(clock)),
            RetryPolicy::new().with_max_attempts(3),
            DeadLetterQueue::new(16),
        )
    }

    fn armed_state(auction_id: AuctionId, generation: u64) -> ClockState {
        let mut state = ClockState::new();
        state.entries.insert(
            auction_id,
            ClockEntry {
                deadline: test_instant() + Duration::minutes(5),
                generation,
                settlement: SettlementProgress::NotStarted,
            },
        );
        state
    }

    #[test]
    fn arm_deadline_acquires_ownership_and_starts_timer() {
        let auction_id = AuctionId::new();
        let deadline = test_instant() + Duration::minutes(5);

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(ClockState::new())
            .when_action(ClockAction::ArmDeadline {
                auction_id,
                deadline,
            })
            .then_state(move |state| {
                assert!(state.is_armed(&auction_id));
                let entry = state.get(&auction_id).unwrap();
                assert_eq!(entry.generation, 0);
                assert_eq!(entry.settlement, SettlementProgress::NotStarted);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects);
            })
            .run();
    }

    #[test]
    fn duplicate_arming_is_refused() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 3))
            .when_action(ClockAction::ArmDeadline {
                auction_id,
                deadline: test_instant() + Duration::minutes(10),
            })
            .then_state(move |state| {
                // The original entry survives untouched
                assert_eq!(state.get(&auction_id).unwrap().generation, 3);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn extension_bumps_generation_and_rearms() {
        let auction_id = AuctionId::new();
        let new_deadline = test_instant() + Duration::minutes(6);

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::ExtendDeadline {
                auction_id,
                deadline: new_deadline,
            })
            .then_state(move |state| {
                let entry = state.get(&auction_id).unwrap();
                assert_eq!(entry.generation, 1);
                assert_eq!(entry.deadline, new_deadline);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects);
            })
            .run();
    }

    #[test]
    fn superseded_timer_is_ignored() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 2))
            .when_action(ClockAction::DeadlineElapsed {
                auction_id,
                generation: 0,
            })
            .then_state(move |state| {
                assert!(state.is_armed(&auction_id));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn current_timer_triggers_close() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 2))
            .when_action(ClockAction::DeadlineElapsed {
                auction_id,
                generation: 2,
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn close_without_winner_releases_ownership_and_skips_settlement() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::AuctionClosed {
                auction_id,
                winning_bid: None,
            })
            .then_state(move |state| {
                assert!(!state.is_armed(&auction_id));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn close_with_winner_starts_settlement() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::AuctionClosed {
                auction_id,
                winning_bid: Some(Bid::new(
                    BidderId::new("alice"),
                    Money::from_dollars(200),
                    test_instant(),
                )),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.get(&auction_id).unwrap().settlement,
                    SettlementProgress::InFlight { attempt: 0 }
                );
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn settlement_failure_schedules_backoff_retry() {
        let auction_id = AuctionId::new();

        ReducerTest::new(ClockReducer::new())
            .with_env(test_env())
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::SettlementFailed {
                auction_id,
                attempt: 0,
                error: "recorder unreachable".to_string(),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.get(&auction_id).unwrap().settlement,
                    SettlementProgress::InFlight { attempt: 1 }
                );
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects);
            })
            .run();
    }

    #[test]
    fn exhausted_settlement_is_deferred_to_the_dlq() {
        let auction_id = AuctionId::new();
        let env = test_env();
        let dlq = env.dlq.clone();

        ReducerTest::new(ClockReducer::new())
            .with_env(env)
            .given_state(armed_state(auction_id, 0))
            // max_attempts is 3, so the failure of attempt 2 is the last
            .when_action(ClockAction::SettlementFailed {
                auction_id,
                attempt: 2,
                error: "recorder unreachable".to_string(),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.get(&auction_id).unwrap().settlement,
                    SettlementProgress::Deferred
                );
                assert_eq!(state.deferred_count(), 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(dlq.len(), 1);
        assert_eq!(dlq.peek().unwrap().payload, auction_id);
    }

    #[test]
    fn redeferral_replaces_the_stale_dlq_entry() {
        let auction_id = AuctionId::new();
        let env = test_env();
        let dlq = env.dlq.clone();

        // A previous deferral already left its audit record
        dlq.push(auction_id, "recorder unreachable".to_string(), 3);

        ReducerTest::new(ClockReducer::new())
            .with_env(env)
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::SettlementFailed {
                auction_id,
                attempt: 2,
                error: "still unreachable".to_string(),
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        // One live entry per auction, carrying the fresh failure
        assert_eq!(dlq.len(), 1);
        assert_eq!(dlq.peek().unwrap().error_message, "still unreachable");
    }

    #[test]
    fn settlement_acknowledgement_releases_ownership() {
        let auction_id = AuctionId::new();
        let env = test_env();
        let dlq = env.dlq.clone();

        // The settlement had previously deferred
        dlq.push(auction_id, "recorder unreachable".to_string(), 3);

        ReducerTest::new(ClockReducer::new())
            .with_env(env)
            .given_state(armed_state(auction_id, 0))
            .when_action(ClockAction::SettlementRecorded { auction_id })
            .then_state(move |state| {
                assert!(!state.is_armed(&auction_id));
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        // The resolved deferral left the alerting queue with the ownership
        assert!(dlq.is_empty());
    }
}
