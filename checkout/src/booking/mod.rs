//! Booking submission.
//!
//! [`BookingSubmitter::prepare`] runs every local check and freezes the
//! checkout into a [`BookingSubmission`]; only then is the single creation
//! request sent. The request is never retried and a ticket identifier is
//! never invented: a success response without one is a failure.

pub mod http;
pub mod mock;

pub use http::HttpBookingApi;
pub use mock::MockBookingApi;

use crate::calendar::DateAvailability;
use crate::cart::CartStore;
use crate::error::{CheckoutError, ConfigError};
use crate::gate::ConfirmationGate;
use crate::otp::OtpChallenge;
use crate::types::{ItemCode, PaymentMode, TicketId, VisitorDetails, VisitorField};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// One line of a booking request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingLine {
    /// Item code
    pub item_code: ItemCode,
    /// Item label
    pub label: String,
    /// Quantity
    pub quantity: u32,
}

/// Body of the booking creation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    /// Visit date (`YYYY-MM-DD`)
    pub visit_date: NaiveDate,
    /// Payment mode
    pub payment_mode: PaymentMode,
    /// Cart lines
    pub items: Vec<BookingLine>,
    /// Visitor name
    pub visitor_name: String,
    /// Visitor email
    pub email: String,
    /// Visitor mobile number
    pub mobile: String,
}

/// Body of the booking creation response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Whether the booking was created
    #[serde(default)]
    pub success: bool,
    /// Server-assigned ticket identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Error or status message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BookingResponse {
    /// A successful response carrying `ticket_id`
    #[must_use]
    pub fn confirmed(ticket_id: impl Into<String>) -> Self {
        Self {
            success: true,
            ticket_id: Some(ticket_id.into()),
            message: None,
        }
    }

    /// A rejection carrying `message`
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ticket_id: None,
            message: Some(message.into()),
        }
    }

    /// The ticket identifier, if the booking was really created.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Server`] if the server reported failure
    /// - [`CheckoutError::MissingTicketId`] if success came without an id
    pub fn into_ticket(self) -> Result<TicketId, CheckoutError> {
        if !self.success {
            return Err(CheckoutError::Server {
                message: self
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Booking was rejected".to_string()),
            });
        }

        self.ticket_id
            .as_deref()
            .and_then(TicketId::from_server)
            .ok_or(CheckoutError::MissingTicketId)
    }
}

/// Outcome of a booking request at the transport level
pub type BookingResult = Result<BookingResponse, CheckoutError>;

/// Booking creation endpoint
pub trait BookingApi: Send + Sync {
    /// Sends one creation request
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Server`] or [`CheckoutError::Network`] when
    /// no well-formed response was received.
    fn create_booking(
        &self,
        submission: BookingSubmission,
    ) -> Pin<Box<dyn Future<Output = BookingResult> + Send>>;
}

/// Success page that receives the ticket identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectTarget {
    base: Url,
}

impl RedirectTarget {
    /// Parses the success page URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `url` does not parse.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        Url::parse(url)
            .map(|base| Self { base })
            .map_err(|_| ConfigError::InvalidUrl {
                key: "SUCCESS_URL",
                value: url.to_string(),
            })
    }

    /// The success URL carrying `ticketId`
    #[must_use]
    pub fn for_ticket(&self, ticket_id: &TicketId) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("ticketId", ticket_id.as_str());
        url.to_string()
    }
}

/// A created booking and where to send the visitor next
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    /// Server-assigned ticket identifier
    pub ticket_id: TicketId,
    /// Success page carrying the identifier
    pub redirect_url: String,
}

/// Builds and sends booking requests
#[derive(Clone)]
pub struct BookingSubmitter {
    api: Arc<dyn BookingApi>,
    redirect: RedirectTarget,
    payment_mode: PaymentMode,
}

impl BookingSubmitter {
    /// Creates a submitter
    #[must_use]
    pub fn new(api: Arc<dyn BookingApi>, redirect: RedirectTarget) -> Self {
        Self {
            api,
            redirect,
            payment_mode: PaymentMode::default(),
        }
    }

    /// Runs the local checks and snapshots the checkout.
    ///
    /// Checks run in this order: gate, visit date, cart, visitor fields.
    /// Nothing is sent.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Precondition`] unless the OTP is verified and terms accepted
    /// - [`CheckoutError::NoDateSelected`] without an open active date
    /// - [`CheckoutError::EmptyCart`] when the cart is empty
    /// - [`CheckoutError::Validation`] for a blank visitor field
    pub fn prepare(
        &self,
        calendar: &DateAvailability,
        cart: &CartStore,
        visitor: &VisitorDetails,
        otp: &OtpChallenge,
        gate: &ConfirmationGate,
    ) -> Result<BookingSubmission, CheckoutError> {
        if !gate.can_proceed(otp) {
            return Err(CheckoutError::Precondition);
        }

        let visit_date = calendar
            .active_slot()
            .map(|slot| slot.date)
            .ok_or(CheckoutError::NoDateSelected)?;

        if cart.is_empty() || cart.grand_total().is_zero() {
            return Err(CheckoutError::EmptyCart);
        }

        for (field, value) in [
            (VisitorField::Name, &visitor.name),
            (VisitorField::Email, &visitor.email),
            (VisitorField::Mobile, &visitor.mobile),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::Validation { field });
            }
        }

        let items = cart
            .lines()
            .iter()
            .map(|line| BookingLine {
                item_code: line.code.clone(),
                label: line.label.clone(),
                quantity: line.quantity,
            })
            .collect();

        Ok(BookingSubmission {
            visit_date,
            payment_mode: self.payment_mode,
            items,
            visitor_name: visitor.name.trim().to_string(),
            email: visitor.email.trim().to_string(),
            mobile: visitor.mobile.trim().to_string(),
        })
    }

    /// Sends `submission` once and interprets the response.
    ///
    /// # Errors
    ///
    /// Any transport, server or missing-identifier failure, unretried.
    pub fn submit(
        &self,
        submission: BookingSubmission,
    ) -> Pin<Box<dyn Future<Output = Result<BookingConfirmation, CheckoutError>> + Send>> {
        let api = Arc::clone(&self.api);
        let redirect = self.redirect.clone();

        Box::pin(async move {
            tracing::info!(
                visit_date = %submission.visit_date,
                lines = submission.items.len(),
                "Submitting booking"
            );

            let ticket_id = api.create_booking(submission).await?.into_ticket()?;
            let redirect_url = redirect.for_ticket(&ticket_id);

            tracing::info!(ticket_id = %ticket_id, "Booking created");
            Ok(BookingConfirmation {
                ticket_id,
                redirect_url,
            })
        })
    }
}

impl std::fmt::Debug for BookingSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingSubmitter")
            .field("redirect", &self.redirect)
            .field("payment_mode", &self.payment_mode)
            .finish_non_exhaustive()
    }
}
