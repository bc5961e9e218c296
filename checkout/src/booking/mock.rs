//! Scripted booking API for tests and local runs

use super::{BookingApi, BookingResponse, BookingResult, BookingSubmission};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    responses: VecDeque<BookingResult>,
    submissions: Vec<BookingSubmission>,
}

/// Booking API that replays queued responses and records every request.
///
/// Clones share the same script and log. Once the queue is empty every
/// request succeeds with a generated `MOCK-<n>` ticket.
#[derive(Clone, Default)]
pub struct MockBookingApi {
    inner: Arc<Mutex<Inner>>,
    latency: Option<Duration>,
}

impl MockBookingApi {
    /// Creates a mock with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of the next request
    #[must_use]
    pub fn with_response(self, result: BookingResult) -> Self {
        self.lock().responses.push_back(result);
        self
    }

    /// Delays every response by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of requests received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().submissions.len()
    }

    /// Every request received, in order
    #[must_use]
    pub fn submissions(&self) -> Vec<BookingSubmission> {
        self.lock().submissions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BookingApi for MockBookingApi {
    fn create_booking(
        &self,
        submission: BookingSubmission,
    ) -> Pin<Box<dyn Future<Output = BookingResult> + Send>> {
        let result = {
            let mut inner = self.lock();
            inner.submissions.push(submission);
            let call = inner.submissions.len();
            inner
                .responses
                .pop_front()
                .unwrap_or_else(|| Ok(BookingResponse::confirmed(format!("MOCK-{call}"))))
        };
        let latency = self.latency;

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            tracing::debug!(ok = result.is_ok(), "Mock booking answered");
            result
        })
    }
}
