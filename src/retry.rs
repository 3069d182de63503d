//! Bounded, fixed-delay retries of a single request.
use crate::client::SendRequest;
use crate::client::request::{Request, Response};
use crate::error::{Error, Result};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many times a request is attempted and how long to wait between
/// attempts.
///
/// The delay is the same before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Time to wait after a failed attempt before the next one.
    pub delay: Duration,
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Create a new `RetryPolicy`.
    ///
    /// At least one attempt is always made.
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// A policy that makes a single attempt.
    pub fn never() -> Self {
        Self::new(Duration::ZERO, 1)
    }
}

/// Send `req`, retrying request-level failures according to `policy`.
///
/// Resolves with the first response received, whatever its status. Fails
/// with the last error once every attempt has failed, immediately on an
/// error that is not retryable, or when `cancel` is cancelled before an
/// attempt.
pub async fn execute<C>(
    client: &C,
    req: &Request,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Response>
where
    C: SendRequest,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }

        let err = match client.send_request(req.clone()).await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= max_attempts {
            warn!(url = req.url(), attempt, error = %err, "request failed");
            return Err(err);
        }

        debug!(url = req.url(), attempt, max_attempts, error = %err, "retrying request");
        attempt += 1;
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}
