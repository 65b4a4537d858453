//! Dependency injection traits.
//!
//! All external dependencies are abstracted behind traits and injected via the
//! Environment parameter. The auction engine cares most about time: the
//! auction clock must be server-owned and testable, so wall-clock access goes
//! through the `Clock` trait rather than `Utc::now()` calls scattered through
//! business logic.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```ignore
/// // Production - uses system clock
/// let clock: Arc<dyn Clock> = Arc::new(SystemClock);
///
/// // Test - fixed time for deterministic deadline checks
/// let clock = FixedClock::new("2025-01-01T00:00:00Z".parse()?);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
