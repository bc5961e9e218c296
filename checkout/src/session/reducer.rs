//! Checkout reducer.
//!
//! Composes the calendar, cart, OTP challenge, gate and submitter into one
//! session. All I/O (OTP delivery, the booking request, the countdown timer)
//! is returned as effects for the store to run.

use super::actions::CheckoutAction;
use super::environment::CheckoutEnvironment;
use super::state::{CheckoutState, Notice, SubmissionStatus};
use crate::calendar::DateSelection;
use crate::cart::{Clamp, QuantityChange};
use crate::error::CheckoutError;
use crate::otp::{OtpSessionId, TickOutcome};
use crate::types::mask_mobile;
use std::sync::Arc;
use std::time::Duration;
use zoo_checkout_core::effect::{Effect, EffectId};
use zoo_checkout_core::reducer::Reducer;
use zoo_checkout_core::{SmallVec, smallvec};

/// Registration id of the OTP countdown timer
pub const OTP_COUNTDOWN: EffectId = EffectId::new("otp-countdown");

/// Countdown resolution
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

type Effects = SmallVec<[Effect<CheckoutAction>; 4]>;

/// Reducer for one checkout session
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn schedule_tick(session: OtpSessionId) -> Effect<CheckoutAction> {
        Effect::Delay {
            duration: TICK_INTERVAL,
            action: Box::new(CheckoutAction::OtpTick { session }),
        }
        .cancellable(OTP_COUNTDOWN)
    }

    fn cancel_countdown() -> Effects {
        smallvec![Effect::Cancel(OTP_COUNTDOWN)]
    }

    fn apply_quantity(state: &mut CheckoutState, result: Result<QuantityChange, CheckoutError>) {
        match result {
            Ok(change) => {
                if change.clamped == Some(Clamp::Ceiling) {
                    state.push_notice(Notice::QuantityClamped(change.code));
                }
            },
            Err(error) => state.record_error(error),
        }
    }

    fn generate_otp(state: &mut CheckoutState, env: &CheckoutEnvironment) -> Effects {
        if state.is_submitting() {
            state.record_error(CheckoutError::SubmissionInFlight);
            return SmallVec::new();
        }
        if !state.can_checkout() {
            state.record_error(CheckoutError::EmptyCart);
            return SmallVec::new();
        }

        let code = env.otp_generator.generate();
        let now = env.clock.now();
        let session =
            match state
                .otp
                .generate(&state.visitor.name, &state.visitor.mobile, code.clone(), now)
            {
                Ok(session) => session,
                Err(error) => {
                    state.record_error(error);
                    return SmallVec::new();
                },
            };

        state.last_error = None;
        state.push_notice(Notice::OtpSent {
            mobile: mask_mobile(&state.visitor.mobile),
            ttl_secs: state.otp.ttl_secs(),
        });

        let delivery = Arc::clone(&env.otp_delivery);
        let name = state.visitor.name.trim().to_string();
        let mobile = state.visitor.mobile.trim().to_string();

        smallvec![
            Effect::Future(Box::pin(async move {
                delivery.deliver(&name, &mobile, &code);
                None
            })),
            Self::schedule_tick(session),
        ]
    }

    fn tick(state: &mut CheckoutState, session: OtpSessionId, env: &CheckoutEnvironment) -> Effects {
        match state.otp.tick(session, env.clock.now()) {
            TickOutcome::Ignored => {
                tracing::trace!(%session, "Ignored stale countdown tick");
                SmallVec::new()
            },
            TickOutcome::Counting(_) => smallvec![Self::schedule_tick(session)],
            TickOutcome::Expired => {
                state.push_notice(Notice::OtpExpired);
                Self::cancel_countdown()
            },
        }
    }

    fn verify(state: &mut CheckoutState, code: &str, env: &CheckoutEnvironment) -> Effects {
        match state.otp.verify(code, env.clock.now()) {
            Ok(()) => {
                state.last_error = None;
                state.push_notice(Notice::OtpVerified);
                Self::cancel_countdown()
            },
            Err(CheckoutError::Expired) => {
                state.push_notice(Notice::OtpExpired);
                state.last_error = Some(CheckoutError::Expired);
                Self::cancel_countdown()
            },
            Err(error @ CheckoutError::AttemptsExhausted) => {
                state.record_error(error);
                Self::cancel_countdown()
            },
            Err(error) => {
                state.record_error(error);
                SmallVec::new()
            },
        }
    }

    fn proceed(state: &mut CheckoutState, env: &CheckoutEnvironment) -> Effects {
        if state.is_submitting() {
            state.record_error(CheckoutError::SubmissionInFlight);
            return SmallVec::new();
        }

        let submission = match env.submitter.prepare(
            &state.calendar,
            &state.cart,
            &state.visitor,
            &state.otp,
            &state.gate,
        ) {
            Ok(submission) => submission,
            Err(error) => {
                state.record_error(error);
                return SmallVec::new();
            },
        };

        state.submission = SubmissionStatus::InFlight;
        state.last_error = None;

        let request = env.submitter.submit(submission);
        smallvec![Effect::Future(Box::pin(async move {
            Some(match request.await {
                Ok(confirmation) => CheckoutAction::BookingSucceeded { confirmation },
                Err(error) => CheckoutAction::BookingFailed { error },
            })
        }))]
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Date selection ==========
            CheckoutAction::Mount => {
                state.calendar.mount(env.today());
                SmallVec::new()
            },

            CheckoutAction::SelectDate { index } => {
                match state.calendar.select_date(index) {
                    DateSelection::Closed(date) => state.push_notice(Notice::ClosedDay(date)),
                    DateSelection::Selected(date) => tracing::debug!(%date, "Visit date selected"),
                    DateSelection::OutOfRange => tracing::debug!(index, "Date index out of range"),
                }
                SmallVec::new()
            },

            CheckoutAction::DismissClosedNotice => {
                state.calendar.dismiss_notice();
                SmallVec::new()
            },

            CheckoutAction::SetLanguage { language } => {
                state.calendar.set_language(language);
                SmallVec::new()
            },

            // ========== Cart ==========
            CheckoutAction::SetQuantity { .. }
            | CheckoutAction::Increment { .. }
            | CheckoutAction::Decrement { .. }
                if state.is_submitting() =>
            {
                state.record_error(CheckoutError::SubmissionInFlight);
                SmallVec::new()
            },

            CheckoutAction::SetQuantity { code, quantity } => {
                let result = state.cart.set_quantity(&code, quantity);
                Self::apply_quantity(state, result);
                SmallVec::new()
            },

            CheckoutAction::Increment { code } => {
                let result = state.cart.increment(&code);
                Self::apply_quantity(state, result);
                SmallVec::new()
            },

            CheckoutAction::Decrement { code } => {
                let result = state.cart.decrement(&code);
                Self::apply_quantity(state, result);
                SmallVec::new()
            },

            CheckoutAction::ClearCart => {
                if state.is_submitting() {
                    state.record_error(CheckoutError::SubmissionInFlight);
                    return SmallVec::new();
                }
                state.cart.clear();
                if let Some(session) = state.otp.reset() {
                    tracing::info!(%session, "OTP session discarded with cart");
                }
                state.gate.reset();
                Self::cancel_countdown()
            },

            // ========== Visitor & OTP ==========
            CheckoutAction::UpdateVisitor { visitor } => {
                let rebinds = state.otp.bound_contact().is_some()
                    && state.visitor.contact_differs(&visitor);
                state.visitor = visitor;

                if rebinds {
                    if let Some(session) = state.otp.reset() {
                        tracing::info!(%session, "Contact changed, OTP session discarded");
                    }
                    return Self::cancel_countdown();
                }
                SmallVec::new()
            },

            CheckoutAction::GenerateOtp => Self::generate_otp(state, env),

            CheckoutAction::OtpTick { session } => Self::tick(state, session, env),

            CheckoutAction::VerifyOtp { code } => Self::verify(state, &code, env),

            // ========== Confirmation ==========
            CheckoutAction::SetTermsAccepted { accepted } => {
                state.gate.set_terms_accepted(accepted);
                SmallVec::new()
            },

            CheckoutAction::Proceed => Self::proceed(state, env),

            CheckoutAction::BookingSucceeded { confirmation } => {
                if !state.is_submitting() {
                    tracing::warn!(ticket_id = %confirmation.ticket_id, "Unexpected booking result");
                }
                state.push_notice(Notice::BookingConfirmed(confirmation.ticket_id.clone()));
                state.submission = SubmissionStatus::Succeeded(confirmation);
                state.last_error = None;
                state.cart.clear();
                state.otp.reset();
                state.gate.reset();
                Self::cancel_countdown()
            },

            CheckoutAction::BookingFailed { error } => {
                state.submission = SubmissionStatus::Failed(error.clone());
                state.record_error(error);
                SmallVec::new()
            },

            // ========== Lifecycle ==========
            CheckoutAction::Teardown => {
                if let Some(session) = state.otp.reset() {
                    tracing::debug!(%session, "OTP session torn down");
                }
                state.gate.reset();
                Self::cancel_countdown()
            },
        }
    }
}
