//! Business metrics for the auction engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `gavel_auctions_listed_total` - Auctions listed
//! - `gavel_bids_committed_total` / `gavel_bids_accepted_total` - Committed bids
//! - `gavel_bid_conflicts_total` - CAS conflicts observed while committing
//! - `gavel_bids_contended_total` - Submissions rejected after the retry budget
//! - `gavel_deadline_extensions_total` - Grace-window deadline extensions
//! - `gavel_auctions_closed_total` / `gavel_auctions_unsold_total` /
//!   `gavel_auctions_settled_total` - Lifecycle outcomes
//! - `gavel_force_closes_total` - Administrative early closes
//! - `gavel_stale_timers_total` - Superseded deadline timers ignored
//! - `gavel_sales_recorded_total` / `gavel_sales_revenue_cents_total` -
//!   Settlement ledger activity
//! - `gavel_settlements_deferred_total` - Settlements parked in the DLQ
//! - `gavel_checkouts_completed_total` - Winner checkouts
//!
//! ## Histograms
//! - `gavel_bid_commit_attempts` - CAS attempts needed per accepted bid

use metrics::{describe_counter, describe_histogram};

/// Register descriptions for all engine metrics.
///
/// Call once at application startup, before any metrics are recorded.
pub fn register_engine_metrics() {
    describe_counter!("gavel_auctions_listed_total", "Total auctions listed");
    describe_counter!(
        "gavel_bids_committed_total",
        "Total bids committed through the registry compare-and-swap"
    );
    describe_counter!(
        "gavel_bids_accepted_total",
        "Total bid submissions accepted by the bid desk"
    );
    describe_counter!(
        "gavel_bid_conflicts_total",
        "Compare-and-swap conflicts observed while committing bids"
    );
    describe_counter!(
        "gavel_bids_contended_total",
        "Bid submissions rejected after exhausting the retry budget"
    );
    describe_histogram!(
        "gavel_bid_commit_attempts",
        "Compare-and-swap attempts needed per accepted bid"
    );
    describe_counter!(
        "gavel_deadline_extensions_total",
        "Deadlines extended by late bids inside the grace window"
    );
    describe_counter!("gavel_auctions_closed_total", "Auctions closed");
    describe_counter!(
        "gavel_auctions_unsold_total",
        "Auctions closed without any bid"
    );
    describe_counter!("gavel_auctions_settled_total", "Auctions settled");
    describe_counter!(
        "gavel_force_closes_total",
        "Administrative early closes"
    );
    describe_counter!(
        "gavel_stale_timers_total",
        "Superseded deadline timers ignored by the clock"
    );
    describe_counter!(
        "gavel_sales_recorded_total",
        "Finalized sales recorded by the payment ledger"
    );
    describe_counter!(
        "gavel_sales_revenue_cents_total",
        "Total recorded sale revenue in cents"
    );
    describe_counter!(
        "gavel_settlements_deferred_total",
        "Settlement deliveries deferred to the dead letter queue"
    );
    describe_counter!(
        "gavel_checkouts_completed_total",
        "Winner checkouts completed"
    );

    tracing::info!("Engine metrics registered");
}
