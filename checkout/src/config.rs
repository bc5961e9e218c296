//! Configuration management for the checkout.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that are present but do not parse fall back to the default with a
//! warning.

use crate::booking::{BookingSubmitter, HttpBookingApi, RedirectTarget};
use crate::calendar::{DEFAULT_CLOSURE_DAY, DEFAULT_WINDOW_DAYS, DateAvailability};
use crate::cart::CartStore;
use crate::error::ConfigError;
use crate::otp::{DEFAULT_OTP_TTL_SECS, OtpChallenge};
use crate::session::{CheckoutState, DEFAULT_PARK_UTC_OFFSET_SECS, park_offset};
use crate::tariff::{HttpPricingSource, PricingSource, StaticPricingSource, TariffCatalog};
use crate::types::Language;
use chrono::{FixedOffset, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Checkout configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Booking service configuration
    pub booking: BookingApiConfig,
    /// Park calendar configuration
    pub park: ParkConfig,
    /// OTP configuration
    pub otp: OtpConfig,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Booking service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingApiConfig {
    /// Base URL of the booking service
    pub base_url: String,
    /// Path of the booking creation endpoint
    pub path: String,
    /// Bearer token sent with booking requests
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Success page receiving `ticketId`
    pub success_url: String,
    /// Pricing document URL (built-in tariff when unset)
    pub pricing_url: Option<String>,
}

/// Park calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkConfig {
    /// Days offered for booking
    pub window_days: usize,
    /// Weekly closure day
    pub closure_day: Weekday,
    /// Date strip language
    pub language: Language,
    /// Park time zone offset in minutes east of UTC
    pub utc_offset_minutes: i32,
}

/// OTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Code lifetime in seconds
    pub ttl_secs: u32,
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "Invalid configuration value, using default");
            default
        }),
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_days = parsed(&lookup, "BOOKING_WINDOW_DAYS", DEFAULT_WINDOW_DAYS);
        let ttl_secs = parsed(&lookup, "OTP_TTL_SECS", DEFAULT_OTP_TTL_SECS);

        Self {
            booking: BookingApiConfig {
                base_url: non_empty(&lookup, "BOOKING_API_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string()),
                path: non_empty(&lookup, "BOOKING_API_PATH")
                    .unwrap_or_else(|| "/api/bookings".to_string()),
                token: non_empty(&lookup, "BOOKING_API_TOKEN"),
                timeout_secs: parsed(&lookup, "BOOKING_API_TIMEOUT_SECS", 30),
                success_url: non_empty(&lookup, "SUCCESS_URL")
                    .unwrap_or_else(|| "http://localhost:8080/booking/success".to_string()),
                pricing_url: non_empty(&lookup, "PRICING_URL"),
            },
            park: ParkConfig {
                window_days: if window_days == 0 {
                    DEFAULT_WINDOW_DAYS
                } else {
                    window_days
                },
                closure_day: parsed(&lookup, "PARK_CLOSURE_DAY", DEFAULT_CLOSURE_DAY),
                language: parsed(&lookup, "UI_LANGUAGE", Language::English),
                utc_offset_minutes: parsed(
                    &lookup,
                    "PARK_UTC_OFFSET_MINUTES",
                    DEFAULT_PARK_UTC_OFFSET_SECS / 60,
                ),
            },
            otp: OtpConfig {
                ttl_secs: if ttl_secs == 0 {
                    DEFAULT_OTP_TTL_SECS
                } else {
                    ttl_secs
                },
            },
            log_level: non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// HTTP client for the booking endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL is invalid or the client cannot be built.
    pub fn booking_api(&self) -> Result<HttpBookingApi, ConfigError> {
        HttpBookingApi::new(
            &self.booking.base_url,
            &self.booking.path,
            self.booking.token.clone(),
            Duration::from_secs(self.booking.timeout_secs),
        )
    }

    /// Submitter posting to the configured endpoint and success page
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either URL is invalid.
    pub fn submitter(&self) -> Result<BookingSubmitter, ConfigError> {
        let api = self.booking_api()?;
        let redirect = RedirectTarget::parse(&self.booking.success_url)?;
        Ok(BookingSubmitter::new(Arc::new(api), redirect))
    }

    /// Where the tariff comes from
    #[must_use]
    pub fn pricing_source(&self) -> Arc<dyn PricingSource> {
        match &self.booking.pricing_url {
            Some(url) => Arc::new(HttpPricingSource::new(
                url.clone(),
                Duration::from_secs(self.booking.timeout_secs),
            )),
            None => Arc::new(StaticPricingSource::default()),
        }
    }

    /// Park time zone
    #[must_use]
    pub fn park_offset(&self) -> FixedOffset {
        park_offset(self.park.utc_offset_minutes.saturating_mul(60))
    }

    /// Fresh session state priced by `catalog`
    #[must_use]
    pub fn initial_state(&self, catalog: Arc<TariffCatalog>) -> CheckoutState {
        CheckoutState::new(
            DateAvailability::new(
                self.park.window_days,
                self.park.closure_day,
                self.park.language,
            ),
            CartStore::new(catalog),
            OtpChallenge::new(self.otp.ttl_secs),
        )
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
