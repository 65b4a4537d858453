//! Error types for web handlers.
//!
//! Bridges engine errors to HTTP responses, implementing Axum's
//! `IntoResponse`. Every entry point shares this one mapping so the
//! request/response contract stays canonical: each rejection carries a
//! machine-readable code alongside the user-facing message.

use crate::engine::EngineError;
use crate::settlement::CheckoutError;
use crate::types::RejectReason;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let auction = engine.auction(id)?;
///     Ok(Json(auction))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    #[allow(dead_code)]
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_ERROR".to_string(),
        )
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }
}

/// Serialized error body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = %self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, code = %self.code, message = %self.message, "Request rejected");
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::NotFound(id) => Self::not_found("Auction", id),
            EngineError::AlreadyListed(id) => {
                Self::conflict(format!("Auction {id} is already listed"))
            },
            EngineError::InvalidStartingPrice => {
                Self::validation("Starting price must be greater than zero")
            },
            EngineError::AlreadyClosed(id, phase) => {
                Self::conflict(format!("Auction {id} is already {phase}"))
            },
            EngineError::NothingToSettle(id) => {
                Self::conflict(format!("Auction {id} has no pending settlement to deliver"))
            },
            EngineError::Rejected(reason) => {
                let code = match &reason {
                    RejectReason::AuctionClosed => "AUCTION_CLOSED",
                    RejectReason::BidTooLow { .. } => "BID_TOO_LOW",
                    RejectReason::InvalidBidder => "INVALID_BIDDER",
                    RejectReason::Contention => "CONTENTION",
                };
                let status = match &reason {
                    // Transient: the caller may retry the whole submission
                    RejectReason::Contention => StatusCode::CONFLICT,
                    // User-correctable, never retried automatically
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                Self::new(status, reason.to_string(), code.to_string())
            },
            EngineError::Checkout(error) => match error {
                CheckoutError::NoRecord(id) => Self::not_found("Payment record for auction", id),
                CheckoutError::NotWinner => {
                    Self::forbidden("Checkout is restricted to the winning bidder")
                },
                CheckoutError::AlreadyCompleted(id) => {
                    Self::conflict(format!("Checkout already completed for auction {id}"))
                },
            },
            EngineError::Unavailable(error) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Engine temporarily unavailable".to_string(),
                "UNAVAILABLE".to_string(),
            )
            .with_source(anyhow::anyhow!(error)),
            EngineError::Internal(message) => Self::internal(message),
        }
    }
}
