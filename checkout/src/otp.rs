//! One-time-code verification of the visitor's mobile number.
//!
//! ```text
//! Idle ──generate──▶ Issued ──verify ok──▶ Verified
//!                      │
//!                      ├──countdown hits 0──▶ Expired
//!                      └──too many wrong codes──▶ Invalid
//! ```
//!
//! Verified, Expired and Invalid only leave through a fresh `generate`, which
//! always mints a new code and a new countdown. Expiry is checked before the
//! code is compared, so a late verify can never beat the countdown.

use crate::error::CheckoutError;
use crate::types::{VisitorField, mask_mobile};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fmt;

/// Number of digits in a code
pub const OTP_LENGTH: usize = 4;

/// Default time-to-live of a code in seconds
pub const DEFAULT_OTP_TTL_SECS: u32 = 120;

/// Wrong codes accepted before the session is invalidated
pub const MAX_VERIFY_ATTEMPTS: u32 = 3;

/// A generated code. Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Wraps a code produced by an [`OtpGenerator`]
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The digits, for delivery to the visitor
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }

    fn matches(&self, input: &str) -> bool {
        self.0 == input
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(****)")
    }
}

/// Identifies one issued session; countdown ticks carry it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OtpSessionId(u64);

impl OtpSessionId {
    /// Creates a session id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OtpSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "otp-{}", self.0)
    }
}

/// A live code bound to a (name, mobile) pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpSession {
    /// Session id
    pub id: OtpSessionId,
    /// Visitor name at generation time
    pub name: String,
    /// Mobile number at generation time
    pub mobile: String,
    code: OtpCode,
    /// When the code was issued
    pub issued_at: DateTime<Utc>,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Seconds left on the countdown
    pub remaining_secs: u32,
    /// Wrong codes entered so far
    pub failed_attempts: u32,
}

impl OtpSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs == 0 || now >= self.expires_at
    }
}

/// State of the challenge
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum OtpState {
    /// No code has been generated
    #[default]
    Idle,
    /// Code generated, countdown running
    Issued(OtpSession),
    /// The visitor entered the right code in time
    Verified {
        /// Session that was verified
        session_id: OtpSessionId,
        /// Verified name
        name: String,
        /// Verified mobile number
        mobile: String,
    },
    /// The countdown reached zero
    Expired {
        /// Session that expired
        session_id: OtpSessionId,
    },
    /// Too many wrong codes were entered
    Invalid {
        /// Session that was invalidated
        session_id: OtpSessionId,
    },
}

/// Result of a countdown tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a session that is no longer counting down
    Ignored,
    /// Still counting; seconds remaining
    Counting(u32),
    /// This tick expired the session
    Expired,
}

/// Produces fresh codes
pub trait OtpGenerator: Send + Sync {
    /// Mints a new [`OTP_LENGTH`]-digit code
    fn generate(&self) -> OtpCode;
}

/// Uniformly random codes from the thread RNG
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOtpGenerator;

impl OtpGenerator for RandomOtpGenerator {
    fn generate(&self) -> OtpCode {
        let value: u32 = rand::thread_rng().gen_range(0..10_000);
        OtpCode::new(format!("{value:04}"))
    }
}

/// Sends a code to the visitor
pub trait OtpDelivery: Send + Sync {
    /// Delivers `code` to `mobile`
    fn deliver(&self, name: &str, mobile: &str, code: &OtpCode);
}

/// Records a delivery notice without the code
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingOtpDelivery;

impl OtpDelivery for LoggingOtpDelivery {
    fn deliver(&self, name: &str, mobile: &str, _code: &OtpCode) {
        tracing::info!(visitor = %name, mobile = %mask_mobile(mobile), "OTP dispatched");
    }
}

/// OTP state machine of one checkout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpChallenge {
    state: OtpState,
    ttl_secs: u32,
    next_session: u64,
}

impl OtpChallenge {
    /// Creates an idle challenge whose codes live for `ttl_secs`
    #[must_use]
    pub const fn new(ttl_secs: u32) -> Self {
        Self {
            state: OtpState::Idle,
            ttl_secs,
            next_session: 1,
        }
    }

    /// Issues `code` to the (name, mobile) pair and starts the countdown.
    ///
    /// Returns the id the countdown ticks must carry.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] if name or mobile is blank
    /// - [`CheckoutError::SessionActive`] while an unexpired code is issued
    pub fn generate(
        &mut self,
        name: &str,
        mobile: &str,
        code: OtpCode,
        now: DateTime<Utc>,
    ) -> Result<OtpSessionId, CheckoutError> {
        if name.trim().is_empty() {
            return Err(CheckoutError::Validation {
                field: VisitorField::Name,
            });
        }
        if mobile.trim().is_empty() {
            return Err(CheckoutError::Validation {
                field: VisitorField::Mobile,
            });
        }
        if let OtpState::Issued(session) = &self.state {
            if !session.is_expired(now) {
                return Err(CheckoutError::SessionActive);
            }
        }

        let id = OtpSessionId(self.next_session);
        self.next_session += 1;

        tracing::info!(session = %id, ttl_secs = self.ttl_secs, "OTP issued");

        self.state = OtpState::Issued(OtpSession {
            id,
            name: name.trim().to_string(),
            mobile: mobile.trim().to_string(),
            code,
            issued_at: now,
            expires_at: now + Duration::seconds(i64::from(self.ttl_secs)),
            remaining_secs: self.ttl_secs,
            failed_attempts: 0,
        });

        Ok(id)
    }

    /// Advances the countdown of `session_id` by one second.
    ///
    /// Ticks for any other session, or for a session that already left
    /// `Issued`, are ignored.
    pub fn tick(&mut self, session_id: OtpSessionId, now: DateTime<Utc>) -> TickOutcome {
        let OtpState::Issued(session) = &mut self.state else {
            return TickOutcome::Ignored;
        };
        if session.id != session_id {
            return TickOutcome::Ignored;
        }

        session.remaining_secs = session.remaining_secs.saturating_sub(1);
        if session.is_expired(now) {
            self.state = OtpState::Expired { session_id };
            tracing::info!(session = %session_id, "OTP expired");
            return TickOutcome::Expired;
        }

        TickOutcome::Counting(session.remaining_secs)
    }

    /// Checks `input` against the issued code.
    ///
    /// An elapsed deadline is applied before the comparison.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NoActiveSession`] if no code was generated
    /// - [`CheckoutError::Expired`] if the countdown has run out
    /// - [`CheckoutError::AttemptsExhausted`] once the session is invalid
    /// - [`CheckoutError::IncompleteCode`] for fewer than [`OTP_LENGTH`] digits
    /// - [`CheckoutError::InvalidCode`] for a wrong code
    pub fn verify(&mut self, input: &str, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        let session = match &mut self.state {
            OtpState::Idle => return Err(CheckoutError::NoActiveSession),
            OtpState::Expired { .. } => return Err(CheckoutError::Expired),
            OtpState::Invalid { .. } => return Err(CheckoutError::AttemptsExhausted),
            OtpState::Verified { .. } => return Ok(()),
            OtpState::Issued(session) => session,
        };

        if session.is_expired(now) {
            let session_id = session.id;
            self.state = OtpState::Expired { session_id };
            tracing::info!(session = %session_id, "OTP expired before verification");
            return Err(CheckoutError::Expired);
        }

        let input = input.trim();
        if input.chars().count() < OTP_LENGTH {
            return Err(CheckoutError::IncompleteCode {
                expected: OTP_LENGTH,
            });
        }

        if !session.code.matches(input) {
            session.failed_attempts += 1;
            let session_id = session.id;
            let attempts_left = MAX_VERIFY_ATTEMPTS.saturating_sub(session.failed_attempts);
            tracing::warn!(session = %session_id, attempts_left, "Incorrect OTP");

            if attempts_left == 0 {
                self.state = OtpState::Invalid { session_id };
                return Err(CheckoutError::AttemptsExhausted);
            }
            return Err(CheckoutError::InvalidCode { attempts_left });
        }

        let session_id = session.id;
        let name = std::mem::take(&mut session.name);
        let mobile = std::mem::take(&mut session.mobile);
        self.state = OtpState::Verified {
            session_id,
            name,
            mobile,
        };
        tracing::info!(session = %session_id, "OTP verified");
        Ok(())
    }

    /// Discards any session and returns to `Idle`
    pub fn reset(&mut self) -> Option<OtpSessionId> {
        let previous = self.session_id();
        self.state = OtpState::Idle;
        previous
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &OtpState {
        &self.state
    }

    /// Id of the current (or last finished) session
    #[must_use]
    pub const fn session_id(&self) -> Option<OtpSessionId> {
        match &self.state {
            OtpState::Idle => None,
            OtpState::Issued(session) => Some(session.id),
            OtpState::Verified { session_id, .. }
            | OtpState::Expired { session_id }
            | OtpState::Invalid { session_id } => Some(*session_id),
        }
    }

    /// Whether a code is issued and counting down
    #[must_use]
    pub const fn is_issued(&self) -> bool {
        matches!(self.state, OtpState::Issued(_))
    }

    /// Whether the visitor has been verified
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self.state, OtpState::Verified { .. })
    }

    /// Seconds left on the countdown, while issued
    #[must_use]
    pub const fn remaining_secs(&self) -> Option<u32> {
        match &self.state {
            OtpState::Issued(session) => Some(session.remaining_secs),
            _ => None,
        }
    }

    /// Name and mobile the current session is bound to
    #[must_use]
    pub fn bound_contact(&self) -> Option<(&str, &str)> {
        match &self.state {
            OtpState::Issued(session) => Some((&session.name, &session.mobile)),
            OtpState::Verified { name, mobile, .. } => Some((name, mobile)),
            _ => None,
        }
    }

    /// Configured time-to-live in seconds
    #[must_use]
    pub const fn ttl_secs(&self) -> u32 {
        self.ttl_secs
    }
}

impl Default for OtpChallenge {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_TTL_SECS)
    }
}
