//! Bid submission endpoint.
//!
//! `POST /api/auctions/:id/bids` - Submit a bid against an open auction.
//!
//! The bidder identity is passed through to the validator untouched, so a
//! blank token is rejected by the engine's rules (`INVALID_BIDDER`) rather
//! than by ad-hoc parsing here. Amounts are cents; ties with the current
//! highest bid are rejected.

use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::types::{AuctionId, BidderId, Money};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to place a bid.
#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    /// Bidder identity token (validated upstream)
    pub bidder_id: String,
    /// Offered amount in cents; must strictly exceed the current highest bid
    pub amount_cents: u64,
}

/// Response for an accepted bid.
#[derive(Debug, Serialize)]
pub struct PlaceBidResponse {
    /// Auction the bid landed on
    pub auction_id: Uuid,
    /// Bidder now holding the highest bid
    pub bidder_id: String,
    /// Committed amount in cents
    pub amount_cents: u64,
    /// When the bid was committed
    pub placed_at: DateTime<Utc>,
    /// The auction's highest bid after the commit (equals `amount_cents`)
    pub highest_bid_cents: u64,
    /// The deadline after the commit
    pub deadline: DateTime<Utc>,
    /// Whether this bid extended the deadline (grace window)
    pub deadline_extended: bool,
}

/// Submit a bid.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auctions/<id>/bids \
///   -H "Content-Type: application/json" \
///   -d '{"bidder_id": "alice@example.com", "amount_cents": 15000}'
/// ```
///
/// Rejections carry canonical codes: `AUCTION_CLOSED`, `BID_TOO_LOW`,
/// `INVALID_BIDDER` (422, user-correctable) and `CONTENTION` (409,
/// retryable).
pub async fn submit_bid(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<PlaceBidResponse>), AppError> {
    let auction_id = AuctionId::from_uuid(auction_id);

    let committed = state
        .engine
        .submit_bid(
            auction_id,
            BidderId::new(request.bidder_id),
            Money::from_cents(request.amount_cents),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceBidResponse {
            auction_id: *auction_id.as_uuid(),
            bidder_id: committed.bid.bidder.to_string(),
            amount_cents: committed.bid.amount.cents(),
            placed_at: committed.bid.placed_at,
            highest_bid_cents: committed.highest_bid.cents(),
            deadline: committed.deadline,
            deadline_extended: committed.deadline_extended,
        }),
    ))
}
