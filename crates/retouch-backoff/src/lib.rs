// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with classified exponential backoff.
//!
//! [`RetryPolicy`] is a pure control-flow combinator: it holds no shared state
//! and is safe to use concurrently from independent calls. Callers supply a
//! classifier that sorts errors into [`ErrorClass`]es; connection errors back
//! off at `base * 2^attempt`, rate-limit errors at `max(5s, base * 3^attempt)`,
//! and anything else is re-raised immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Rate-limit waits never drop below this floor, regardless of the base delay.
const RATE_LIMIT_FLOOR: Duration = Duration::from_secs(5);

/// How an error should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient network failure. Retried with `base * 2^attempt`.
    Connection,
    /// Provider rate limit. Retried with `max(5s, base * 3^attempt)`.
    RateLimit,
    /// Not retryable. Re-raised immediately.
    Fatal,
}

/// Transient-network failure signatures, matched as substrings.
const CONNECTION_SIGNATURES: &[&str] = &[
    "ECONNRESET",
    "Connection error",
    "ENOTFOUND",
    "ETIMEDOUT",
    "socket hang up",
];

/// Rate-limit signatures, matched as substrings.
const RATE_LIMIT_SIGNATURES: &[&str] = &["429", "rate limit", "exceeded the rate limit"];

/// Classify an error message by its text alone.
///
/// Rate-limit signatures win over connection signatures, mirroring the
/// provider's error texts where "429" can appear alongside socket noise.
pub fn classify_message(message: &str) -> ErrorClass {
    if RATE_LIMIT_SIGNATURES.iter().any(|s| message.contains(s)) {
        return ErrorClass::RateLimit;
    }
    if CONNECTION_SIGNATURES.iter().any(|s| message.contains(s)) {
        return ErrorClass::Connection;
    }
    ErrorClass::Fatal
}

/// Retry policy: maximum retry count plus base delay.
///
/// `max_retries` counts retries, not attempts: a policy with `max_retries = 3`
/// makes up to four calls in total.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry count and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// The wait before the next attempt, given the error class and the
    /// zero-based attempt that just failed. `Fatal` yields no delay.
    pub fn delay_for(&self, class: ErrorClass, attempt: u32) -> Option<Duration> {
        match class {
            ErrorClass::Connection => {
                Some(self.base_delay.saturating_mul(2u32.saturating_pow(attempt)))
            }
            ErrorClass::RateLimit => {
                let exp = self.base_delay.saturating_mul(3u32.saturating_pow(attempt));
                Some(exp.max(RATE_LIMIT_FLOOR))
            }
            ErrorClass::Fatal => None,
        }
    }

    /// Run `op`, retrying per this policy.
    ///
    /// Returns the first success. A `Fatal` classification, or a retryable
    /// failure on the final attempt, re-raises the error unchanged.
    pub async fn run<T, E, C, F, Fut>(&self, classify: C, mut op: F) -> Result<T, E>
    where
        C: Fn(&E) -> ErrorClass,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let class = classify(&err);
                    if class == ErrorClass::Fatal || attempt >= self.max_retries {
                        return Err(err);
                    }
                    // delay_for is Some for every non-Fatal class.
                    let delay = self
                        .delay_for(class, attempt)
                        .unwrap_or(self.base_delay);
                    warn!(
                        attempt = attempt + 1,
                        class = ?class,
                        delay_ms = delay.as_millis() as u64,
                        "retryable error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
