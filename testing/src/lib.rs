//! # Gavel Testing
//!
//! Testing utilities and helpers for the Gavel auction engine architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (deterministic clocks)
//! - The [`ReducerTest`] Given-When-Then harness for reducer unit tests
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use gavel_testing::{ReducerTest, mocks::test_clock};
//!
//! ReducerTest::new(ClockReducer::new())
//!     .with_env(test_environment())
//!     .given_state(ClockState::new())
//!     .when_action(ClockAction::ArmDeadline { auction_id, deadline })
//!     .then_state(|state| assert!(state.is_armed(&auction_id)))
//!     .then_effects(|effects| assert_eq!(effects.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use gavel_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use gavel_testing::mocks::FixedClock;
    /// use gavel_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Manually advanced clock for deadline tests
    ///
    /// Starts at a given instant and only moves when the test calls
    /// [`ManualClock::advance`]. Deadline and grace-window logic can be
    /// exercised without sleeping.
    ///
    /// # Example
    ///
    /// ```
    /// use gavel_testing::mocks::{ManualClock, test_instant};
    /// use gavel_core::environment::Clock;
    /// use chrono::Duration;
    ///
    /// let clock = ManualClock::new(test_instant());
    /// let before = clock.now();
    /// clock.advance(Duration::seconds(30));
    /// assert_eq!(clock.now() - before, Duration::seconds(30));
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a new manual clock starting at the given time
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(start),
            }
        }

        /// Advance the clock by the given duration
        pub fn advance(&self, by: Duration) {
            let mut time = self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// A fixed instant for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_instant() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_instant())
    }
}
