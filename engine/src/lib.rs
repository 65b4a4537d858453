//! Gavel - an auction marketplace bidding engine
//!
//! Sellers list items, bidders place bids within a server-owned countdown
//! window, and the highest bidder proceeds to a checkout flow that records a
//! payment record. An administrative surface manages auctions and payment
//! records.
//!
//! # Architecture
//!
//! ```text
//!                    submitBid / getAuction / forceClose
//!                                  │
//!                          ┌───────▼────────┐
//!                          │   HTTP (Axum)  │
//!                          └───────┬────────┘
//!                          ┌───────▼────────┐
//!                          │ AuctionEngine  │
//!                          └───┬───────┬────┘
//!            read/validate/CAS │       │ arm / extend / force-close
//!                      ┌───────▼──┐ ┌──▼────────────────┐
//!                      │ BidDesk  │ │  Auction Clock    │
//!                      └───────┬──┘ │ (reducer + Store) │
//!                              │    └──┬────────────┬───┘
//!                      ┌───────▼───────▼──┐   ┌─────▼──────────┐
//!                      │ Auction Registry │   │ Payment Ledger │
//!                      │  (CAS on bids)   │   │ (dedup by id)  │
//!                      └──────────────────┘   └────────────────┘
//! ```
//!
//! # Key Properties
//!
//! ## 1. Race-free highest-bid updates
//!
//! Bid commits go through an optimistic compare-and-swap on the registry:
//! of two concurrent submissions that observed the same prior highest bid,
//! at most one wins. The loser re-reads fresh state and re-validates, up to
//! a bounded retry budget.
//!
//! ## 2. Server-owned closing time
//!
//! Deadlines live in the registry and timers in the auction clock; clients
//! only poll snapshots. A valid bid inside the grace window extends the
//! deadline, preventing last-instant snipe-closing.
//!
//! ## 3. Idempotent settlement
//!
//! Closure with a winner emits a finalized-sale fact to the payment ledger
//! exactly once per auction id, retried with backoff under at-least-once
//! delivery and deferred to a dead letter queue when the collaborator stays
//! down - observable and resumable, never silently dropped.

pub mod aggregates;
pub mod api;
pub mod bidding;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod settlement;
pub mod types;

pub use bidding::{BidDesk, BidError, validate};
pub use config::Config;
pub use engine::{AuctionEngine, EngineError, EngineStats, NewListing};
pub use registry::{AuctionRegistry, CommittedBid, InMemoryAuctionRegistry, RegistryError};
pub use server::{AppState, build_router};
pub use settlement::{
    FlakyPaymentRecorder, InMemoryPaymentLedger, PaymentRecorder, SaleOutcome, SettlementError,
};
pub use types::*;
