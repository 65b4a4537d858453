//! Reducer-based aggregates for the auction engine.

pub mod lifecycle;

pub use lifecycle::{
    ClockAction, ClockEntry, ClockEnvironment, ClockReducer, ClockState, ClockStore,
    SettlementProgress,
};
