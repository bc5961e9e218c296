//! State owned by one checkout session

use crate::booking::BookingConfirmation;
use crate::calendar::DateAvailability;
use crate::cart::{CartStore, MAX_QTY_PER_ITEM};
use crate::error::CheckoutError;
use crate::gate::ConfirmationGate;
use crate::otp::OtpChallenge;
use crate::types::{ItemCode, TicketId, VisitorDetails};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::fmt;

/// Notices kept before the oldest is dropped
pub const NOTICE_CAPACITY: usize = 20;

/// Lifecycle of the booking request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Nothing sent yet (or the last attempt can be retried)
    #[default]
    Idle,
    /// A request is waiting for its response
    InFlight,
    /// The booking was created
    Succeeded(BookingConfirmation),
    /// The last request failed
    Failed(CheckoutError),
}

/// A user-facing message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The visitor picked the weekly closure day
    ClosedDay(NaiveDate),
    /// A quantity was lowered to the per-item ceiling
    QuantityClamped(ItemCode),
    /// An OTP was sent
    OtpSent {
        /// Masked mobile number
        mobile: String,
        /// Seconds the code is valid for
        ttl_secs: u32,
    },
    /// The OTP countdown ran out
    OtpExpired,
    /// The mobile number was verified
    OtpVerified,
    /// The booking was created
    BookingConfirmed(TicketId),
    /// An operation failed
    Error(CheckoutError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedDay(date) => write!(
                f,
                "The park is closed on {}, please choose another date",
                date.format("%d %b %Y")
            ),
            Self::QuantityClamped(code) => {
                write!(f, "At most {MAX_QTY_PER_ITEM} tickets can be booked for {code}")
            },
            Self::OtpSent { mobile, ttl_secs } => {
                write!(f, "OTP sent to {mobile}, valid for {ttl_secs} seconds")
            },
            Self::OtpExpired => f.write_str("OTP expired, please generate a new one"),
            Self::OtpVerified => f.write_str("Mobile number verified"),
            Self::BookingConfirmed(ticket_id) => write!(f, "Booking confirmed: {ticket_id}"),
            Self::Error(error) => write!(f, "{error}"),
        }
    }
}

/// Everything one checkout session holds
#[derive(Clone, Debug)]
pub struct CheckoutState {
    /// Visit date strip
    pub calendar: DateAvailability,
    /// Ticket cart
    pub cart: CartStore,
    /// Visitor details as typed
    pub visitor: VisitorDetails,
    /// OTP challenge
    pub otp: OtpChallenge,
    /// Terms acceptance
    pub gate: ConfirmationGate,
    /// Booking request lifecycle
    pub submission: SubmissionStatus,
    /// Recent notices, oldest first
    pub notices: VecDeque<Notice>,
    /// Most recent error
    pub last_error: Option<CheckoutError>,
}

impl CheckoutState {
    /// Creates a session from its components
    #[must_use]
    pub fn new(calendar: DateAvailability, cart: CartStore, otp: OtpChallenge) -> Self {
        Self {
            calendar,
            cart,
            visitor: VisitorDetails::default(),
            otp,
            gate: ConfirmationGate::new(),
            submission: SubmissionStatus::Idle,
            notices: VecDeque::with_capacity(NOTICE_CAPACITY),
            last_error: None,
        }
    }

    /// Whether the cart total allows entering checkout
    #[must_use]
    pub fn can_checkout(&self) -> bool {
        !self.cart.grand_total().is_zero()
    }

    /// Whether the generate-OTP action is enabled
    #[must_use]
    pub fn can_generate_otp(&self) -> bool {
        self.can_checkout() && !self.otp.is_issued() && !self.is_submitting()
    }

    /// Whether the proceed action is enabled
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        self.gate.can_proceed(&self.otp)
            && self.calendar.active_slot().is_some()
            && self.can_checkout()
            && !self.is_submitting()
    }

    /// Whether a booking request is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.submission, SubmissionStatus::InFlight)
    }

    /// Success page to hand off to, once a booking was created
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match &self.submission {
            SubmissionStatus::Succeeded(confirmation) => Some(&confirmation.redirect_url),
            _ => None,
        }
    }

    /// Latest notice
    #[must_use]
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == NOTICE_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub(crate) fn record_error(&mut self, error: CheckoutError) {
        tracing::warn!(%error, "Checkout action rejected");
        self.push_notice(Notice::Error(error.clone()));
        self.last_error = Some(error);
    }
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self::new(
            DateAvailability::default(),
            CartStore::default(),
            OtpChallenge::default(),
        )
    }
}
