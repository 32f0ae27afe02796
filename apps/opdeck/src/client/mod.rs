//! Rate-limited JSON client.
//!
//! Every outbound request to AniList or AnimeThemes goes through
//! [`RateLimitedClient`]. Rate limits (429) and server errors (5xx) are
//! retried with capped exponential backoff plus jitter, honoring
//! `Retry-After` when the server sends one. Any other failure status is
//! returned immediately.

pub mod error;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{is_retryable_status, NetworkError};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// Retry limits for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to exponential waits.
    pub jitter: Duration,
    /// Floor applied to server-provided `Retry-After` waits.
    pub min_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(16_000),
            jitter: Duration::from_millis(250),
            min_retry_after: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt + 1`.
    ///
    /// A parseable `Retry-After` (seconds) wins and is floored at
    /// `min_retry_after`; otherwise `min(base * 2^attempt, max) + jitter`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<&str>) -> Duration {
        if let Some(wait) = retry_after.and_then(parse_retry_after) {
            return wait.max(self.min_retry_after);
        }
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        exponential + jitter(self.jitter)
    }
}

/// Longest server-requested wait honored; larger values are clamped.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60 * 60);

/// `Retry-After` in seconds, capped at [`MAX_RETRY_AFTER`]. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_secs_f64(secs.min(MAX_RETRY_AFTER.as_secs_f64())))
}

/// Uniform random duration in `[0, max]`.
pub(crate) fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// States of the bounded retry loop.
///
/// `Attempting(n)` only ever follows `Backoff(n - 1)`, and `n` never reaches
/// `max_attempts`, so the loop always terminates.
#[derive(Debug)]
enum RetryState {
    Attempting(u32),
    Backoff { attempt: u32, wait: Duration },
    Succeeded(HttpResponse),
    FailedTerminal(NetworkError),
}

/// JSON client with bounded retry.
#[derive(Debug)]
pub struct RateLimitedClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RateLimitedClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and parse the successful body as JSON.
    pub async fn request(&self, request: &HttpRequest) -> Result<Value, NetworkError> {
        self.request_json(request).await
    }

    /// Send a request and deserialize the successful body.
    pub async fn request_json<D: DeserializeOwned>(
        &self,
        request: &HttpRequest,
    ) -> Result<D, NetworkError> {
        let response = self.send(request).await?;
        serde_json::from_str(&response.body).map_err(|e| NetworkError::Decode(e.to_string()))
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RetryState::Attempting(0);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    let can_retry = attempt + 1 < max_attempts;
                    match self.transport.execute(request).await {
                        Ok(resp) if resp.is_success() => RetryState::Succeeded(resp),
                        Ok(resp) if is_retryable_status(resp.status) && can_retry => {
                            let wait = self.policy.delay_for(attempt, resp.retry_after.as_deref());
                            tracing::warn!(
                                url = %request.url,
                                status = resp.status,
                                attempt = attempt + 1,
                                wait_ms = wait.as_millis() as u64,
                                "transient response, backing off"
                            );
                            RetryState::Backoff { attempt, wait }
                        }
                        Ok(resp) => RetryState::FailedTerminal(NetworkError::Status {
                            status: resp.status,
                            body: resp.body,
                        }),
                        Err(e) if e.is_transient() && can_retry => {
                            let wait = self.policy.delay_for(attempt, None);
                            tracing::warn!(
                                url = %request.url,
                                error = %e,
                                attempt = attempt + 1,
                                wait_ms = wait.as_millis() as u64,
                                "request failed, backing off"
                            );
                            RetryState::Backoff { attempt, wait }
                        }
                        Err(e) => RetryState::FailedTerminal(e),
                    }
                }
                RetryState::Backoff { attempt, wait } => {
                    tokio::time::sleep(wait).await;
                    RetryState::Attempting(attempt + 1)
                }
                RetryState::Succeeded(resp) => return Ok(resp),
                RetryState::FailedTerminal(e) => {
                    tracing::debug!(url = %request.url, error = %e, "request failed");
                    return Err(e);
                }
            };
        }
    }
}
