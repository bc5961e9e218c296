//! Everything that can happen to a checkout session

use crate::booking::BookingConfirmation;
use crate::error::CheckoutError;
use crate::otp::OtpSessionId;
use crate::types::{ItemCode, Language, VisitorDetails};

/// Checkout actions: visitor input, timer ticks and booking results
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// The checkout page opened; regenerates the date window
    Mount,
    /// The visitor tapped a date slot
    SelectDate {
        /// Slot index in the window
        index: usize,
    },
    /// The visitor closed the closed-day notice
    DismissClosedNotice,
    /// The visitor switched language
    SetLanguage {
        /// New language
        language: Language,
    },
    /// Direct quantity input
    SetQuantity {
        /// Item code
        code: ItemCode,
        /// Requested quantity (clamped)
        quantity: i64,
    },
    /// Plus button
    Increment {
        /// Item code
        code: ItemCode,
    },
    /// Minus button
    Decrement {
        /// Item code
        code: ItemCode,
    },
    /// Empties the cart and discards the OTP session
    ClearCart,
    /// The visitor edited the contact form
    UpdateVisitor {
        /// Form contents
        visitor: VisitorDetails,
    },
    /// Generate (or regenerate) an OTP for the current name and mobile
    GenerateOtp,
    /// One second of the OTP countdown elapsed
    OtpTick {
        /// Session the tick was scheduled for
        session: OtpSessionId,
    },
    /// The visitor submitted a code
    VerifyOtp {
        /// Entered digits
        code: String,
    },
    /// Terms checkbox toggled
    SetTermsAccepted {
        /// Checkbox value
        accepted: bool,
    },
    /// The visitor pressed proceed
    Proceed,
    /// The booking service created the booking
    BookingSucceeded {
        /// Ticket and redirect
        confirmation: BookingConfirmation,
    },
    /// The booking request failed
    BookingFailed {
        /// Failure to surface
        error: CheckoutError,
    },
    /// The visitor navigated away
    Teardown,
}
