//! Zoo Checkout - booking checkout for the zoological park storefront
//!
//! Covers everything between "pick a date" and "hand the ticket to the
//! payment page":
//!
//! - **Tariff**: priced catalog of entry, parking, transport and camera items
//! - **Dates**: a rolling booking window with a weekly closure day
//! - **Cart**: clamped quantities, totals per line, per category and overall
//! - **OTP**: a time-bound code verifying the visitor's mobile number
//! - **Gate**: verified identity plus explicit terms acceptance
//! - **Booking**: one non-retried creation request and the success redirect
//!
//! # Architecture
//!
//! ```text
//!   visitor input ─┐
//!   countdown tick ─┼──▶ Store (one queue) ──▶ CheckoutReducer ──▶ CheckoutState
//!   booking result ─┘                               │
//!                                                   ▼
//!                                    Effects: OTP delivery, countdown,
//!                                             booking request
//! ```
//!
//! The components in [`calendar`], [`cart`], [`otp`], [`gate`] and
//! [`booking`] are plain structs without I/O. [`session`] composes them into
//! a reducer that the runtime store drives.
//!
//! # Gate sequence
//!
//! ```text
//! cart total > 0 → generate OTP → verify OTP → accept terms → proceed
//! ```
//!
//! Skipping or racing any step is rejected with a [`CheckoutError`].

#![forbid(unsafe_code)]

pub mod booking;
pub mod calendar;
pub mod cart;
pub mod config;
pub mod error;
pub mod gate;
pub mod otp;
pub mod session;
pub mod tariff;
pub mod types;

pub use booking::{
    BookingApi, BookingConfirmation, BookingResponse, BookingSubmission, BookingSubmitter,
    HttpBookingApi, MockBookingApi, RedirectTarget,
};
pub use calendar::{DateAvailability, DateSlot};
pub use cart::{CartLine, CartStore, MAX_QTY_PER_ITEM};
pub use config::CheckoutConfig;
pub use error::{CatalogError, CheckoutError, ConfigError};
pub use gate::ConfirmationGate;
pub use otp::{OtpChallenge, OtpState};
pub use session::{
    CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState, CheckoutStore,
    SubmissionStatus,
};
pub use tariff::{TariffCatalog, TariffEntry};
pub use types::{ItemCode, Rupees, TicketCategory, TicketId, VisitorDetails};
