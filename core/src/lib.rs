//! # Gavel Core
//!
//! Core traits and types for the Gavel auction engine architecture.
//!
//! This crate provides the fundamental abstractions for building the
//! event-driven bidding engine using the Reducer pattern:
//!
//! - **State**: Domain state for a feature (e.g. the per-auction clock book)
//! - **Action**: All possible inputs to a reducer (commands and events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use gavel_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug)]
//! enum ClockAction {
//!     ArmDeadline { auction_id: AuctionId, deadline: DateTime<Utc> },
//!     DeadlineElapsed { auction_id: AuctionId, generation: u64 },
//! }
//!
//! impl Reducer for ClockReducer {
//!     type State = ClockState;
//!     type Action = ClockAction;
//!     type Environment = ClockEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ClockState,
//!         action: ClockAction,
//!         env: &ClockEnvironment,
//!     ) -> SmallVec<[Effect<ClockAction>; 4]> {
//!         // Business logic goes here
//!         smallvec![]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub mod effect;
pub mod environment;
pub mod reducer;
