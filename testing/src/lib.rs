//! # Zoo Checkout Testing
//!
//! Testing utilities for reducers built on `zoo-checkout-core`.
//!
//! - [`FixedClock`] and [`ManualClock`] for deterministic time
//! - [`ReducerTest`] for Given-When-Then reducer tests
//! - [`assertions`] for inspecting returned effects
//!
//! ## Example
//!
//! ```ignore
//! use zoo_checkout_testing::{ManualClock, ReducerTest};
//!
//! let clock = ManualClock::at(test_time());
//! ReducerTest::new(CheckoutReducer::new())
//!     .with_env(test_environment(clock.clone()))
//!     .given_state(CheckoutState::default())
//!     .when_action(CheckoutAction::ClearCart)
//!     .then_state(|state| assert!(state.cart.is_empty()))
//!     .run();
//! ```

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

use chrono::{DateTime, Utc};
use zoo_checkout_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// ```
    /// use zoo_checkout_testing::mocks::FixedClock;
    /// use zoo_checkout_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
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

    /// Clock that only moves when a test advances it
    ///
    /// Clones share the same underlying time, so a test can keep one handle
    /// and hand another to the environment under test.
    ///
    /// ```
    /// use zoo_checkout_testing::mocks::ManualClock;
    /// use zoo_checkout_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let clock = ManualClock::at(start);
    /// let shared = clock.clone();
    /// clock.advance(Duration::seconds(30));
    /// assert_eq!(shared.now(), start + Duration::seconds(30));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = match self.time.write() {
                Ok(time) => time,
                Err(poisoned) => poisoned.into_inner(),
            };
            *time += by;
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            let mut time = match self.time.write() {
                Ok(time) => time,
                Err(poisoned) => poisoned.into_inner(),
            };
            *time = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            match self.time.read() {
                Ok(time) => *time,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    /// Create a default fixed clock for tests (2025-01-10 09:00:00 UTC, a Friday)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_time())
    }

    /// The instant used by [`test_clock`]
    #[must_use]
    pub fn test_time() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_736_499_600, 0).unwrap_or_default()
    }
}

pub use mocks::{FixedClock, ManualClock, test_clock, test_time};
