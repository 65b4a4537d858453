//! Settlement: recording finalized sales with the payment collaborator.
//!
//! On auction closure with a winning bid the engine emits a finalized-sale
//! fact to the payment-recording collaborator exactly once. Delivery is
//! at-least-once (the clock retries with backoff), so the collaborator
//! deduplicates by auction id - which the engine always passes.
//!
//! [`InMemoryPaymentLedger`] models the collaborator and also backs the
//! checkout and admin surfaces: the winner attaches a shipping address and
//! payment-method details to the pending record. Card data is stored, never
//! charged.

use crate::types::{AuctionId, BidderId, Money, PaymentMethod, PaymentRecord, PaymentStatus};
use gavel_core::environment::Clock;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Settlement delivery result
pub type SettlementResult = Result<SaleOutcome, SettlementError>;

/// Outcome of a finalized-sale delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaleOutcome {
    /// A new payment record was created
    Recorded,
    /// A record for this auction already existed; nothing was duplicated
    AlreadyRecorded,
}

/// Errors from the payment-recording collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Transient delivery failure; the caller retries with backoff
    #[error("Payment recorder unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the winner's checkout flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// No payment record exists for this auction (not yet settled, or no sale)
    #[error("No payment record for auction {0}")]
    NoRecord(AuctionId),

    /// Only the winning bidder may complete checkout
    #[error("Checkout is restricted to the winning bidder")]
    NotWinner,

    /// Checkout details were already provided
    #[error("Checkout already completed for auction {0}")]
    AlreadyCompleted(AuctionId),
}

/// Payment-recording collaborator.
///
/// Implementations must be idempotent per `auction_id`: calling
/// `finalize_sale` twice with the same auction must not create a second
/// payment record.
pub trait PaymentRecorder: Send + Sync {
    /// Record a finalized sale.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Unavailable`] on transient delivery failure.
    fn finalize_sale(
        &self,
        auction_id: AuctionId,
        buyer: BidderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = SettlementResult> + Send>>;
}

/// In-memory payment ledger, deduplicated by auction id.
///
/// Doubles as the query surface for the checkout flow and the admin payments
/// listing.
pub struct InMemoryPaymentLedger {
    records: Mutex<HashMap<AuctionId, PaymentRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPaymentLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AuctionId, PaymentRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Look up the payment record for an auction.
    #[must_use]
    pub fn record(&self, auction_id: AuctionId) -> Option<PaymentRecord> {
        self.lock().get(&auction_id).cloned()
    }

    /// All payment records, most recent first.
    #[must_use]
    pub fn records(&self) -> Vec<PaymentRecord> {
        let mut records: Vec<PaymentRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        records
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Attach the winner's checkout details to the pending record.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NoRecord`] if the auction has no settled sale
    /// - [`CheckoutError::NotWinner`] if `buyer` is not the recorded winner
    /// - [`CheckoutError::AlreadyCompleted`] if details were already provided
    pub fn attach_checkout(
        &self,
        auction_id: AuctionId,
        buyer: &BidderId,
        shipping_address: String,
        method: PaymentMethod,
    ) -> Result<PaymentRecord, CheckoutError> {
        let mut records = self.lock();
        let record = records
            .get_mut(&auction_id)
            .ok_or(CheckoutError::NoRecord(auction_id))?;

        if &record.buyer != buyer {
            return Err(CheckoutError::NotWinner);
        }

        if record.status == PaymentStatus::Completed {
            return Err(CheckoutError::AlreadyCompleted(auction_id));
        }

        record.shipping_address = Some(shipping_address);
        record.method = Some(method);
        record.status = PaymentStatus::Completed;

        metrics::counter!("gavel_checkouts_completed_total").increment(1);
        tracing::info!(auction_id = %auction_id, buyer = %buyer, "Checkout completed");

        Ok(record.clone())
    }
}

impl PaymentRecorder for InMemoryPaymentLedger {
    fn finalize_sale(
        &self,
        auction_id: AuctionId,
        buyer: BidderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = SettlementResult> + Send>> {
        let outcome = {
            let mut records = self.lock();
            if records.contains_key(&auction_id) {
                tracing::debug!(auction_id = %auction_id, "Sale already recorded, deduplicated");
                SaleOutcome::AlreadyRecorded
            } else {
                let record = PaymentRecord::new(auction_id, buyer.clone(), amount, self.clock.now());
                records.insert(auction_id, record);

                metrics::counter!("gavel_sales_recorded_total").increment(1);
                metrics::counter!("gavel_sales_revenue_cents_total").increment(amount.cents());
                tracing::info!(
                    auction_id = %auction_id,
                    buyer = %buyer,
                    amount = amount.cents(),
                    "Finalized sale recorded"
                );
                SaleOutcome::Recorded
            }
        };

        Box::pin(async move { Ok(outcome) })
    }
}

/// A recorder that fails a configured number of deliveries before delegating.
///
/// Used to exercise the settlement retry and dead-letter paths without a real
/// flaky collaborator.
pub struct FlakyPaymentRecorder {
    inner: Arc<dyn PaymentRecorder>,
    failures_remaining: AtomicU32,
}

impl FlakyPaymentRecorder {
    /// Wrap `inner`, failing the first `failures` deliveries.
    #[must_use]
    pub fn new(inner: Arc<dyn PaymentRecorder>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: AtomicU32::new(failures),
        }
    }
}

impl PaymentRecorder for FlakyPaymentRecorder {
    fn finalize_sale(
        &self,
        auction_id: AuctionId,
        buyer: BidderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = SettlementResult> + Send>> {
        let remaining = self.failures_remaining.load(Ordering::Acquire);
        if remaining > 0 {
            self.failures_remaining
                .store(remaining - 1, Ordering::Release);
            return Box::pin(async move {
                Err(SettlementError::Unavailable(
                    "injected delivery failure".to_string(),
                ))
            });
        }

        self.inner.finalize_sale(auction_id, buyer, amount)
    }
}
