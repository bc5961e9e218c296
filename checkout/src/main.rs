//! Interactive checkout demo.
//!
//! Walks one session through the gate sequence on the terminal. The OTP is
//! printed to stdout in place of an SMS. Pass `--mock` to answer bookings
//! locally instead of calling the configured booking service.

use anyhow::{Context, bail};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use zoo_checkout::booking::{BookingSubmitter, RedirectTarget};
use zoo_checkout::otp::{OtpCode, OtpDelivery, RandomOtpGenerator};
use zoo_checkout::types::mask_mobile;
use zoo_checkout::{
    CheckoutAction, CheckoutConfig, CheckoutEnvironment, CheckoutReducer, CheckoutStore,
    ItemCode, MockBookingApi, SubmissionStatus, TariffCatalog, VisitorDetails,
};
use zoo_checkout_core::environment::SystemClock;

/// Prints the code to the terminal
struct ConsoleOtpDelivery;

impl OtpDelivery for ConsoleOtpDelivery {
    fn deliver(&self, _name: &str, mobile: &str, code: &OtpCode) {
        println!("\n  [SMS to {}] Your zoo booking OTP is {}", mask_mobile(mobile), code.reveal());
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str, default: &str) -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{label} [{default}]: ").as_bytes()).await?;
    stdout.flush().await?;

    let line = lines.next_line().await?.unwrap_or_default();
    let line = line.trim();
    Ok(if line.is_empty() { default.to_string() } else { line.to_string() })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = CheckoutConfig::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "zoo_checkout={0},zoo_checkout_runtime={0}",
                config.log_level
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let use_mock = std::env::args().any(|arg| arg == "--mock");
    info!(
        booking_url = %config.booking.base_url,
        mock = use_mock,
        window_days = config.park.window_days,
        "Configuration loaded"
    );

    // Tariff
    let catalog = match config.pricing_source().load().await {
        Ok(catalog) => catalog,
        Err(error) => {
            warn!(%error, "Pricing source unavailable, using standard tariff");
            TariffCatalog::standard()
        },
    };

    // Booking service
    let submitter = if use_mock {
        BookingSubmitter::new(
            Arc::new(MockBookingApi::new().with_latency(Duration::from_millis(300))),
            RedirectTarget::parse(&config.booking.success_url)?,
        )
    } else {
        config.submitter().context("invalid booking service configuration")?
    };

    let environment = CheckoutEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(RandomOtpGenerator),
        Arc::new(ConsoleOtpDelivery),
        submitter,
    )
    .with_park_offset(config.park_offset());

    let store = CheckoutStore::new(
        config.initial_state(Arc::new(catalog)),
        CheckoutReducer::new(),
        environment,
    );

    // Date
    store.send(CheckoutAction::Mount).await?;
    let visit_date = store
        .state(|s| s.calendar.active_slot().map(|slot| slot.key()))
        .await
        .context("no open visit date in the booking window")?;
    println!("Visit date: {visit_date}");

    // Cart
    for action in [
        CheckoutAction::SetQuantity { code: ItemCode::from("zoo_adult"), quantity: 2 },
        CheckoutAction::Increment { code: ItemCode::from("parking_4w_lmv") },
    ] {
        store.send(action).await?;
    }
    store
        .state(|s| {
            for line in s.cart.lines() {
                println!("  {:<32} x{:<2} {}", line.label, line.quantity, line.line_total());
            }
            println!("  {:<36} {}", "Total", s.cart.grand_total());
        })
        .await;

    // Visitor
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let visitor = VisitorDetails::new(
        prompt(&mut lines, "Visitor name", "Asha").await?,
        prompt(&mut lines, "Email", "asha@example.com").await?,
        prompt(&mut lines, "Mobile", "9999999999").await?,
    );
    store.send(CheckoutAction::UpdateVisitor { visitor }).await?;

    // OTP
    store.send(CheckoutAction::GenerateOtp).await?;
    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        bail!("could not generate OTP: {error}");
    }

    let code = prompt(&mut lines, "Enter OTP", "").await?;
    store.send(CheckoutAction::VerifyOtp { code }).await?;
    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        bail!("verification failed: {error}");
    }

    // Terms and booking
    store.send(CheckoutAction::SetTermsAccepted { accepted: true }).await?;
    if !store.state(|s| s.can_proceed()).await {
        bail!("checkout is not ready to proceed");
    }

    store
        .send_and_wait_for(
            CheckoutAction::Proceed,
            |action| {
                matches!(
                    action,
                    CheckoutAction::BookingSucceeded { .. } | CheckoutAction::BookingFailed { .. }
                )
            },
            Duration::from_secs(config.booking.timeout_secs + 5),
        )
        .await?;

    let outcome = store.state(|s| s.submission.clone()).await;
    store.send(CheckoutAction::Teardown).await?;
    store.shutdown(Duration::from_secs(5)).await?;

    match outcome {
        SubmissionStatus::Succeeded(confirmation) => {
            println!("Booking {} created", confirmation.ticket_id);
            println!("Continue to payment: {}", confirmation.redirect_url);
            Ok(())
        },
        SubmissionStatus::Failed(error) => bail!("booking failed: {error}"),
        SubmissionStatus::Idle | SubmissionStatus::InFlight => bail!("booking did not complete"),
    }
}
