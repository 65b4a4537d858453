//! Auction listing and snapshot endpoints.
//!
//! - `POST /api/auctions` - List an item for auction
//! - `GET /api/auctions` - Catalog of auctions, most recently listed first
//! - `GET /api/auctions/:id` - Full auction snapshot with bid history
//!
//! The remaining-time field is computed server-side from the engine clock;
//! clients render it, they never decide closure.

use crate::engine::NewListing;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::types::{Auction, Bid, Money, SellerId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to list a new item for auction.
#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    /// Item name
    pub item_name: String,
    /// Item description
    pub description: String,
    /// Opaque reference to an externally hosted image
    pub image_ref: Option<String>,
    /// Seller identity token (validated upstream)
    pub seller_id: String,
    /// Starting price in cents; must be positive
    pub starting_price_cents: u64,
    /// Bidding window in seconds; server default applies when absent
    pub duration_secs: Option<i64>,
}

/// A committed bid, as rendered to clients.
#[derive(Debug, Serialize)]
pub struct BidView {
    /// Bidder identity
    pub bidder_id: String,
    /// Bid amount in cents
    pub amount_cents: u64,
    /// When the bid was committed
    pub placed_at: DateTime<Utc>,
}

impl From<&Bid> for BidView {
    fn from(bid: &Bid) -> Self {
        Self {
            bidder_id: bid.bidder.to_string(),
            amount_cents: bid.amount.cents(),
            placed_at: bid.placed_at,
        }
    }
}

/// Catalog entry for an auction.
#[derive(Debug, Serialize)]
pub struct AuctionSummary {
    /// Auction id
    pub id: Uuid,
    /// Item name
    pub item_name: String,
    /// Starting price in cents
    pub starting_price_cents: u64,
    /// Current highest bid in cents
    pub highest_bid_cents: u64,
    /// Number of committed bids
    pub bid_count: usize,
    /// Lifecycle phase
    pub phase: String,
    /// Absolute close time
    pub deadline: DateTime<Utc>,
    /// Server-computed seconds until close; `None` once bidding ended
    pub seconds_remaining: Option<i64>,
}

impl AuctionSummary {
    /// Render a catalog entry, computing remaining time at `now`.
    #[must_use]
    pub fn from_auction(auction: &Auction, now: DateTime<Utc>) -> Self {
        Self {
            id: *auction.id.as_uuid(),
            item_name: auction.item_name.clone(),
            starting_price_cents: auction.starting_price.cents(),
            highest_bid_cents: auction.highest_bid.cents(),
            bid_count: auction.bid_history.len(),
            phase: auction.phase.to_string(),
            deadline: auction.deadline,
            seconds_remaining: auction.time_remaining(now).map(|d| d.num_seconds()),
        }
    }
}

/// Full auction snapshot.
#[derive(Debug, Serialize)]
pub struct AuctionDetail {
    /// Auction id
    pub id: Uuid,
    /// Item name
    pub item_name: String,
    /// Item description
    pub description: String,
    /// Opaque image reference
    pub image_ref: Option<String>,
    /// Seller identity
    pub seller_id: String,
    /// Starting price in cents
    pub starting_price_cents: u64,
    /// Current highest bid in cents
    pub highest_bid_cents: u64,
    /// Bidder holding the highest bid
    pub highest_bidder_id: Option<String>,
    /// Chronological bid history, strictly increasing in amount
    pub bids: Vec<BidView>,
    /// Lifecycle phase
    pub phase: String,
    /// Absolute close time
    pub deadline: DateTime<Utc>,
    /// Server-computed seconds until close; `None` once bidding ended
    pub seconds_remaining: Option<i64>,
    /// When the item was listed
    pub listed_at: DateTime<Utc>,
}

impl AuctionDetail {
    /// Render a snapshot for clients, computing remaining time at `now`.
    #[must_use]
    pub fn from_auction(auction: &Auction, now: DateTime<Utc>) -> Self {
        Self {
            id: *auction.id.as_uuid(),
            item_name: auction.item_name.clone(),
            description: auction.description.clone(),
            image_ref: auction.image_ref.clone(),
            seller_id: auction.seller.to_string(),
            starting_price_cents: auction.starting_price.cents(),
            highest_bid_cents: auction.highest_bid.cents(),
            highest_bidder_id: auction.highest_bidder.as_ref().map(ToString::to_string),
            bids: auction.bid_history.iter().map(BidView::from).collect(),
            phase: auction.phase.to_string(),
            deadline: auction.deadline,
            seconds_remaining: auction.time_remaining(now).map(|d| d.num_seconds()),
            listed_at: auction.listed_at,
        }
    }
}

/// Catalog response.
#[derive(Debug, Serialize)]
pub struct ListAuctionsResponse {
    /// Auctions, most recently listed first
    pub auctions: Vec<AuctionSummary>,
    /// Total count
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// List a new item for auction.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auctions \
///   -H "Content-Type: application/json" \
///   -d '{
///     "item_name": "Vintage camera",
///     "description": "1970s rangefinder",
///     "seller_id": "seller-42",
///     "starting_price_cents": 10000,
///     "duration_secs": 86400
///   }'
/// ```
pub async fn create_auction(
    State(state): State<AppState>,
    Json(request): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<AuctionDetail>), AppError> {
    if request.item_name.trim().is_empty() {
        return Err(AppError::bad_request("Item name is required"));
    }

    let seller: SellerId = request
        .seller_id
        .parse()
        .map_err(|_| AppError::bad_request("Seller identity is required"))?;

    if let Some(duration) = request.duration_secs {
        if duration <= 0 {
            return Err(AppError::validation(
                "Auction duration must be greater than zero",
            ));
        }
    }

    let auction = state
        .engine
        .open_auction(NewListing {
            item_name: request.item_name,
            description: request.description,
            image_ref: request.image_ref,
            seller,
            starting_price: Money::from_cents(request.starting_price_cents),
            duration: request.duration_secs.map(Duration::seconds),
        })
        .await?;

    let now = state.engine.now();
    Ok((
        StatusCode::CREATED,
        Json(AuctionDetail::from_auction(&auction, now)),
    ))
}

/// Catalog of auctions, most recently listed first.
pub async fn list_auctions(State(state): State<AppState>) -> Json<ListAuctionsResponse> {
    let now = state.engine.now();
    let auctions: Vec<AuctionSummary> = state
        .engine
        .auctions()
        .iter()
        .map(|auction| AuctionSummary::from_auction(auction, now))
        .collect();

    let total = auctions.len();
    Json(ListAuctionsResponse { auctions, total })
}

/// Full snapshot of one auction, including its bid history.
pub async fn get_auction(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<AuctionDetail>, AppError> {
    let auction = state
        .engine
        .auction(crate::types::AuctionId::from_uuid(auction_id))?;

    let now = state.engine.now();
    Ok(Json(AuctionDetail::from_auction(&auction, now)))
}
