//! Dependencies injected into the checkout reducer

use crate::booking::BookingSubmitter;
use crate::otp::{OtpDelivery, OtpGenerator};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::sync::Arc;
use zoo_checkout_core::environment::Clock;

/// Park local time offset from UTC (IST, +05:30)
pub const DEFAULT_PARK_UTC_OFFSET_SECS: i32 = 19_800;

/// Environment for [`CheckoutReducer`](super::CheckoutReducer)
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Time source for OTP deadlines and "today"
    pub clock: Arc<dyn Clock>,
    /// Mints OTP codes
    pub otp_generator: Arc<dyn OtpGenerator>,
    /// Sends OTP codes
    pub otp_delivery: Arc<dyn OtpDelivery>,
    /// Sends bookings
    pub submitter: BookingSubmitter,
    /// Offset used to decide the park's current date
    pub park_offset: FixedOffset,
}

impl CheckoutEnvironment {
    /// Creates an environment in the park's default time zone
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        otp_generator: Arc<dyn OtpGenerator>,
        otp_delivery: Arc<dyn OtpDelivery>,
        submitter: BookingSubmitter,
    ) -> Self {
        Self {
            clock,
            otp_generator,
            otp_delivery,
            submitter,
            park_offset: park_offset(DEFAULT_PARK_UTC_OFFSET_SECS),
        }
    }

    /// Overrides the park's UTC offset
    #[must_use]
    pub fn with_park_offset(mut self, offset: FixedOffset) -> Self {
        self.park_offset = offset;
        self
    }

    /// The park's current calendar date
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.park_offset).date_naive()
    }
}

/// Offset of `secs` east of UTC, or UTC when out of range
#[must_use]
pub fn park_offset(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}
