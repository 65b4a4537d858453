//! Administrative endpoints.
//!
//! - `POST /api/admin/auctions/:id/close` - Force-close an open auction
//! - `POST /api/admin/auctions/:id/settlement/retry` - Re-deliver a deferred
//!   settlement
//! - `DELETE /api/admin/auctions/:id` - Archive an auction
//! - `GET /api/admin/stats` - Dashboard counts with recent activity
//!
//! Administrative identity is validated upstream; handlers only record the
//! acting administrator for the audit trail.

use super::auctions::{AuctionDetail, AuctionSummary};
use super::payments::PaymentRecordView;
use crate::engine::EngineStats;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::types::AuctionId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many recent entries the dashboard shows.
const DASHBOARD_RECENT: usize = 5;

/// Request body for a force close.
#[derive(Debug, Deserialize)]
pub struct ForceCloseRequest {
    /// Administrator requesting the close (audit trail)
    pub actor_id: String,
}

/// Response after a mutation with a human-readable confirmation.
#[derive(Debug, Serialize)]
pub struct AdminActionResponse {
    /// Affected auction
    pub auction_id: Uuid,
    /// Confirmation message
    pub message: String,
}

/// Dashboard payload: counts plus recent activity.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Aggregate engine counts
    pub stats: EngineStats,
    /// Most recently listed auctions
    pub recent_auctions: Vec<AuctionSummary>,
    /// Most recent payment records
    pub recent_payments: Vec<PaymentRecordView>,
}

/// Force-close an open auction ahead of its deadline.
///
/// The close is atomic with in-flight bid commits: the last bid to win the
/// compare-and-swap before the transition lands is final. Returns the frozen
/// auction.
pub async fn force_close(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ForceCloseRequest>,
) -> Result<Json<AuctionDetail>, AppError> {
    if request.actor_id.trim().is_empty() {
        return Err(AppError::bad_request("Acting administrator is required"));
    }

    let auction = state
        .engine
        .force_close(AuctionId::from_uuid(auction_id), &request.actor_id)
        .await?;

    let now = state.engine.now();
    Ok(Json(AuctionDetail::from_auction(&auction, now)))
}

/// Re-deliver a deferred settlement.
///
/// Accepted (202) when the delivery was re-queued; the auction transitions to
/// settled once the payment recorder acknowledges.
pub async fn retry_settlement(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AdminActionResponse>), AppError> {
    let auction_id = AuctionId::from_uuid(auction_id);
    state.engine.retry_settlement(auction_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AdminActionResponse {
            auction_id: *auction_id.as_uuid(),
            message: "Settlement delivery re-queued".to_string(),
        }),
    ))
}

/// Archive an auction.
pub async fn delete_auction(
    Path(auction_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let auction_id = AuctionId::from_uuid(auction_id);
    state.engine.remove_auction(auction_id).await?;

    Ok(Json(AdminActionResponse {
        auction_id: *auction_id.as_uuid(),
        message: "Auction removed".to_string(),
    }))
}

/// Dashboard counts with recent activity.
pub async fn stats(State(state): State<AppState>) -> Json<DashboardResponse> {
    let now = state.engine.now();
    let stats = state.engine.stats().await;

    let recent_auctions: Vec<AuctionSummary> = state
        .engine
        .auctions()
        .iter()
        .take(DASHBOARD_RECENT)
        .map(|auction| AuctionSummary::from_auction(auction, now))
        .collect();

    let recent_payments: Vec<PaymentRecordView> = state
        .engine
        .payment_records()
        .into_iter()
        .take(DASHBOARD_RECENT)
        .map(PaymentRecordView::from)
        .collect();

    Json(DashboardResponse {
        stats,
        recent_auctions,
        recent_payments,
    })
}
