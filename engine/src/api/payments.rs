//! Checkout and payment record endpoints.
//!
//! - `POST /api/auctions/:id/checkout` - Winner attaches shipping and payment
//!   details to the recorded sale
//! - `GET /api/admin/payments` - All payment records (administrative)
//!
//! Payment records are correlated to auctions by id, never by item name.
//! Card details are stored, never charged.

use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::types::{AuctionId, BidderId, PaymentMethod, PaymentRecord};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to complete checkout for a won auction.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Bidder identity; must match the recorded winner
    pub bidder_id: String,
    /// Shipping address
    pub shipping_address: String,
    /// Payment method details (stored, never charged)
    pub payment_method: PaymentMethod,
}

/// A payment record, as rendered to clients.
#[derive(Debug, Serialize)]
pub struct PaymentRecordView {
    /// Auction this record settles
    pub auction_id: Uuid,
    /// Winning bidder
    pub buyer_id: String,
    /// Final sale amount in cents
    pub amount_cents: u64,
    /// Record status: pending until checkout details arrive
    pub status: String,
    /// Shipping address from checkout
    pub shipping_address: Option<String>,
    /// Payment method details from checkout
    pub payment_method: Option<PaymentMethod>,
    /// When the sale was recorded
    pub recorded_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentRecordView {
    fn from(record: PaymentRecord) -> Self {
        Self {
            auction_id: *record.auction_id.as_uuid(),
            buyer_id: record.buyer.to_string(),
            amount_cents: record.amount.cents(),
            status: format!("{:?}", record.status).to_lowercase(),
            shipping_address: record.shipping_address,
            payment_method: record.method,
            recorded_at: record.recorded_at,
        }
    }
}

/// Payment records listing.
#[derive(Debug, Serialize)]
pub struct ListPaymentsResponse {
    /// Records, most recent first
    pub payments: Vec<PaymentRecordView>,
    /// Total count
    pub total: usize,
}

/// Complete checkout for a won auction.
///
/// Only the winning bidder may check out, exactly once.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auctions/<id>/checkout \
///   -H "Content-Type: application/json" \
///   -d '{
///     "bidder_id": "alice@example.com",
///     "shipping_address": "1 Main St",
///     "payment_method": {"kind": "card", "number": "4242424242424242", "expiry": "12/27"}
///   }'
/// ```
pub async fn checkout(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<PaymentRecordView>, AppError> {
    if request.shipping_address.trim().is_empty() {
        return Err(AppError::bad_request("Shipping address is required"));
    }

    let record = state.engine.checkout(
        AuctionId::from_uuid(auction_id),
        &BidderId::new(request.bidder_id),
        request.shipping_address,
        request.payment_method,
    )?;

    Ok(Json(record.into()))
}

/// All payment records, most recent first (administrative).
pub async fn list_payments(State(state): State<AppState>) -> Json<ListPaymentsResponse> {
    let payments: Vec<PaymentRecordView> = state
        .engine
        .payment_records()
        .into_iter()
        .map(PaymentRecordView::from)
        .collect();

    let total = payments.len();
    Json(ListPaymentsResponse { payments, total })
}
