//! Error types for the checkout.
//!
//! Every [`CheckoutError`] is scoped to the checkout flow and recoverable: the
//! reducer records it in state, surfaces its `Display` text to the visitor and
//! leaves the session able to correct and retry.

use crate::types::{ItemCode, VisitorField};
use thiserror::Error;

/// Errors raised by checkout components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A required visitor field is missing
    #[error("Please enter the visitor's {field}")]
    Validation {
        /// The missing field
        field: VisitorField,
    },

    /// Fewer digits than the code length were entered
    #[error("Please enter all {expected} digits of the OTP")]
    IncompleteCode {
        /// Code length
        expected: usize,
    },

    /// The entered code does not match
    #[error("Incorrect OTP, {attempts_left} attempt(s) left")]
    InvalidCode {
        /// Wrong attempts allowed before the session is invalidated
        attempts_left: u32,
    },

    /// Verify was attempted before any OTP was generated
    #[error("Please generate an OTP first")]
    NoActiveSession,

    /// The OTP countdown reached zero
    #[error("OTP expired, please generate a new one")]
    Expired,

    /// Too many wrong codes were entered for this OTP
    #[error("Too many incorrect attempts, please generate a new OTP")]
    AttemptsExhausted,

    /// An OTP is still live for this checkout
    #[error("An OTP has already been sent, please wait for it to expire before requesting a new one")]
    SessionActive,

    /// Checkout was attempted with nothing in the cart
    #[error("Please select at least one ticket")]
    EmptyCart,

    /// The item code is not in the tariff
    #[error("Unknown item: {0}")]
    UnknownItem(ItemCode),

    /// Identity is not verified or terms are not accepted
    #[error("Please verify your mobile number and accept the terms and conditions")]
    Precondition,

    /// No open visit date is selected
    #[error("Please select a visit date")]
    NoDateSelected,

    /// A booking request is already waiting for a response
    #[error("Your booking is already being processed")]
    SubmissionInFlight,

    /// The booking service reported success without a ticket identifier
    #[error("Booking could not be confirmed: no ticket number was returned")]
    MissingTicketId,

    /// The booking service rejected the request
    #[error("{message}")]
    Server {
        /// Message supplied by the server
        message: String,
    },

    /// The booking service could not be reached
    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised while loading a tariff
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two entries share an item code
    #[error("Duplicate tariff entry for item {0}")]
    DuplicateCode(ItemCode),

    /// The pricing document could not be parsed
    #[error("Malformed pricing document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The pricing source could not be reached
    #[error("Pricing source unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while turning configuration into clients
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured URL does not parse
    #[error("Invalid URL in {key}: {value}")]
    InvalidUrl {
        /// Environment variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
