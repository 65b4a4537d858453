//! Domain types for the auction marketplace bidding engine.
//!
//! This module contains the value objects and entities shared by the registry,
//! the bidding path, the auction clock, and the settlement ledger.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an auction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionId(Uuid);

impl AuctionId {
    /// Creates a new random `AuctionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AuctionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AuctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for identity token parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid identity token: {0}")]
pub struct ParseIdentityError(String);

/// Identity of a bidder, as supplied by the upstream identity collaborator.
///
/// The engine trusts identity tokens validated upstream, so this is a newtype
/// over the opaque token string rather than a locally-generated id.
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects blank tokens)
/// - `new()`: No validation (for internal use with trusted input)
///
/// Use `FromStr` when parsing external input; use `new()` when constructing
/// from application-controlled data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidderId(String);

impl BidderId {
    /// Create a new `BidderId` from a trusted string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token is usable: non-empty after trimming.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for BidderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BidderId {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdentityError(
                "Bidder identity cannot be blank".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }
}

/// Identity of a seller, as supplied by the upstream identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(String);

impl SellerId {
    /// Create a new `SellerId` from a trusted string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SellerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SellerId {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdentityError(
                "Seller identity cannot be blank".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (dollars * 100 > `u64::MAX`).
    /// Use `checked_from_dollars` for non-panicking conversion.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_dollars(dollars: u64) -> Self {
        match dollars.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_dollars overflow"),
        }
    }

    /// Creates a `Money` value from dollars with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at the numeric bound
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.dollars(), self.0 % 100)
    }
}

// ============================================================================
// Bids
// ============================================================================

/// A monetary offer by a bidder. Immutable once appended to the bid history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Bidder holding this bid
    pub bidder: BidderId,
    /// Offered amount, strictly greater than the previous highest bid
    pub amount: Money,
    /// When the bid was committed
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a new `Bid`
    #[must_use]
    pub const fn new(bidder: BidderId, amount: Money, placed_at: DateTime<Utc>) -> Self {
        Self {
            bidder,
            amount,
            placed_at,
        }
    }
}

// ============================================================================
// Auction lifecycle
// ============================================================================

/// Auction lifecycle phase.
///
/// Transitions are monotonic: `Open → Closing → Closed → Settled`, never
/// backwards. Once `Closed`, the highest bid and bidder are frozen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Accepting bids until the deadline
    Open,
    /// Deadline elapsed (or force-closed); winner being finalized, bids frozen
    Closing,
    /// Winner finalized; settlement pending or skipped (no bids)
    Closed,
    /// Settlement acknowledged by the payment-recording collaborator
    Settled,
}

impl AuctionPhase {
    /// Whether a transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closing)
                | (Self::Closing, Self::Closed)
                | (Self::Closed, Self::Settled)
        )
    }

    /// Whether the auction still accepts bids in this phase.
    #[must_use]
    pub const fn accepts_bids(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// Auction entity: a listed item accepting bids until a deadline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    /// Unique auction identifier
    pub id: AuctionId,
    /// Item name (e.g. "Vintage camera")
    pub item_name: String,
    /// Item description
    pub description: String,
    /// Opaque reference to an externally hosted image
    pub image_ref: Option<String>,
    /// Seller who listed the item
    pub seller: SellerId,
    /// Starting price; the first bid must exceed it
    pub starting_price: Money,
    /// Current highest bid; starts equal to `starting_price`
    pub highest_bid: Money,
    /// Bidder holding `highest_bid`; `None` until the first bid
    pub highest_bidder: Option<BidderId>,
    /// Append-only, chronologically ordered, strictly increasing in amount
    pub bid_history: Vec<Bid>,
    /// Current lifecycle phase
    pub phase: AuctionPhase,
    /// Absolute timestamp after which no further bids are accepted
    pub deadline: DateTime<Utc>,
    /// When the item was listed
    pub listed_at: DateTime<Utc>,
}

impl Auction {
    /// Opens a new auction for a listed item.
    ///
    /// The highest bid starts equal to the starting price with no bidder
    /// attached; the first accepted bid must strictly exceed it.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn open(
        id: AuctionId,
        item_name: String,
        description: String,
        image_ref: Option<String>,
        seller: SellerId,
        starting_price: Money,
        listed_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_name,
            description,
            image_ref,
            seller,
            starting_price,
            highest_bid: starting_price,
            highest_bidder: None,
            bid_history: Vec::new(),
            phase: AuctionPhase::Open,
            deadline,
            listed_at,
        }
    }

    /// Whether any bid has been accepted.
    #[must_use]
    pub const fn has_bids(&self) -> bool {
        self.highest_bidder.is_some()
    }

    /// Time remaining before the deadline, `None` once it has passed or the
    /// auction no longer accepts bids. Server-computed: clients observe this,
    /// they never decide it.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.phase.accepts_bids() && now < self.deadline {
            Some(self.deadline - now)
        } else {
            None
        }
    }
}

/// Why a bid submission was rejected.
///
/// `AuctionClosed`, `BidTooLow` and `InvalidBidder` are user-correctable and
/// never retried automatically. `Contention` is transient: the caller may
/// retry the whole submission.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The auction is past its deadline or no longer open
    #[error("Auction is closed to bidding")]
    AuctionClosed,

    /// The offered amount does not strictly exceed the current highest bid
    #[error("Bid must be higher than the current highest bid of {current}")]
    BidTooLow {
        /// The highest bid at validation time
        current: Money,
    },

    /// The bidder identity token is blank or malformed
    #[error("Bidder identity is missing or malformed")]
    InvalidBidder,

    /// The commit retry budget was exhausted under concurrent bidding
    #[error("Too many concurrent bids, please retry")]
    Contention,
}

// ============================================================================
// Payment records (external collaborator's entity, referenced not owned)
// ============================================================================

/// Payment method details captured at checkout. Stored, never charged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment details
    Card {
        /// Card number as entered
        number: String,
        /// Expiry in MM/YY form
        expiry: String,
    },
    /// Pay on delivery
    CashOnDelivery,
}

/// Payment record status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Sale recorded, checkout details not yet provided
    Pending,
    /// Winner completed checkout
    Completed,
}

/// A finalized-sale record held by the payment-recording collaborator.
///
/// Created exactly once per auction upon settlement (deduplicated by
/// `auction_id`); shipping and payment-method details arrive later through
/// the winner's checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Auction this record settles. One record per auction, ever.
    pub auction_id: AuctionId,
    /// Winning bidder
    pub buyer: BidderId,
    /// Final sale amount
    pub amount: Money,
    /// Record status
    pub status: PaymentStatus,
    /// Shipping address from checkout
    pub shipping_address: Option<String>,
    /// Payment method details from checkout
    pub method: Option<PaymentMethod>,
    /// When the sale was recorded
    pub recorded_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a new pending `PaymentRecord` at settlement time.
    #[must_use]
    pub const fn new(
        auction_id: AuctionId,
        buyer: BidderId,
        amount: Money,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            auction_id,
            buyer,
            amount,
            status: PaymentStatus::Pending,
            shipping_address: None,
            method: None,
            recorded_at,
        }
    }
}
