//! The checkout session: one state, one reducer, one action queue.
//!
//! User input, countdown ticks and booking results all arrive as
//! [`CheckoutAction`]s and are reduced one at a time by the store, so the
//! components never observe each other half-updated.

mod actions;
mod environment;
mod reducer;
mod state;


pub use actions::CheckoutAction;
pub use environment::{CheckoutEnvironment, DEFAULT_PARK_UTC_OFFSET_SECS, park_offset};
pub use reducer::{CheckoutReducer, OTP_COUNTDOWN, TICK_INTERVAL};
pub use state::{CheckoutState, NOTICE_CAPACITY, Notice, SubmissionStatus};

use zoo_checkout_runtime::Store;

/// Store running a checkout session
pub type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;
