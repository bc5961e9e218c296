//! Terms acceptance and the final go/no-go check before booking.

use crate::otp::OtpChallenge;

/// Holds the visitor's explicit terms acceptance.
///
/// Starts unaccepted in every session and is only changed by
/// [`ConfirmationGate::set_terms_accepted`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationGate {
    terms_accepted: bool,
}

impl ConfirmationGate {
    /// Creates a gate with terms not accepted
    #[must_use]
    pub const fn new() -> Self {
        Self {
            terms_accepted: false,
        }
    }

    /// Records the visitor ticking (or unticking) the terms box
    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    /// Whether terms are accepted
    #[must_use]
    pub const fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// `true` only when the OTP is verified and terms are accepted
    #[must_use]
    pub const fn can_proceed(&self, otp: &OtpChallenge) -> bool {
        otp.is_verified() && self.terms_accepted
    }

    /// Withdraws acceptance
    pub fn reset(&mut self) {
        self.terms_accepted = false;
    }
}
