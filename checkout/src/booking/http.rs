//! Booking API client over HTTP

use super::{BookingApi, BookingResponse, BookingResult, BookingSubmission};
use crate::error::{CheckoutError, ConfigError};
use reqwest::{Client, Url};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Posts bookings to the booking creation endpoint
#[derive(Clone, Debug)]
pub struct HttpBookingApi {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpBookingApi {
    /// Creates a client for `{base_url}{path}`
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidUrl`] if the endpoint does not parse
    /// - [`ConfigError::HttpClient`] if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        path: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
        let endpoint = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl {
            key: "BOOKING_API_URL",
            value: raw.clone(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// The endpoint bookings are posted to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl BookingApi for HttpBookingApi {
    fn create_booking(
        &self,
        submission: BookingSubmission,
    ) -> Pin<Box<dyn Future<Output = BookingResult> + Send>> {
        let mut request = self.client.post(self.endpoint.clone()).json(&submission);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Box::pin(async move {
            let response = request.send().await.map_err(|e| {
                tracing::error!(error = %e, timeout = e.is_timeout(), "Booking request failed");
                if e.is_timeout() {
                    CheckoutError::Network("The booking service did not respond in time".to_string())
                } else {
                    CheckoutError::Network(e.to_string())
                }
            })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| CheckoutError::Network(e.to_string()))?;

            if status.is_success() {
                return serde_json::from_str::<BookingResponse>(&body).map_err(|e| {
                    tracing::error!(%status, error = %e, "Unreadable booking response");
                    CheckoutError::Server {
                        message: "Unexpected response from the booking service".to_string(),
                    }
                });
            }

            tracing::warn!(%status, "Booking rejected");
            let message = serde_json::from_str::<BookingResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
                });

            Err(CheckoutError::Server { message })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let api = HttpBookingApi::new(
            "https://api.zoo.example/",
            "/api/bookings",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(api.endpoint().as_str(), "https://api.zoo.example/api/bookings");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let result = HttpBookingApi::new("zoo", "/api/bookings", None, Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl { key: "BOOKING_API_URL", .. })
        ));
    }
}
