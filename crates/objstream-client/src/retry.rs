//! Bounded Exponential Backoff
//!
//! Every RPC the read channel issues — the open-time metadata probe, the
//! footer prefetch, range stream opens, and response-stream pumps — runs
//! under a bounded retry budget with exponentially growing delays.
//!
//! ## Retry scopes
//!
//! The channel has two kinds of retry scope, and they use different
//! predicates:
//!
//! - **Read-side scopes** (whole-open, stream open, response pump) retry
//!   *every* error until the budget runs out. These closures are idempotent:
//!   streams are generation-pinned, so reissuing a range read returns
//!   identical bytes. Terminal channel errors (missing object, gzip
//!   rejection) are filtered out before they reach the budget.
//! - **The metadata probe** retries only transient transport codes
//!   ([`RetryPolicy::is_retryable`]); a `NOT_FOUND` must surface immediately
//!   instead of burning the budget on an object that is not there.
//!
//! ## Two entry points
//!
//! [`retry_with_backoff`] wraps a self-contained closure and is what `open`
//! uses. The stream-open and pump loops cannot be closures — they swap the
//! stub out between attempts when the transport is broken — so they drive a
//! [`Backoff`] counter by hand inside their own `loop`.

use std::time::Duration;
use tokio::time::sleep;
use tonic::Status;
use tracing::{debug, warn};

/// Bounded exponential backoff configuration.
///
/// Delay for attempt `n` (0-indexed) is
/// `initial_backoff * backoff_multiplier^n`, capped at `max_backoff`. The
/// budget allows `max_retries` re-attempts after the initial try.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Re-attempts allowed after the initial try
    pub max_retries: usize,

    /// Delay before the first re-attempt
    pub initial_backoff: Duration,

    /// Ceiling on the delay between attempts
    pub max_backoff: Duration,

    /// Growth factor applied per attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: usize,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Delay for a given attempt number (0-indexed), capped at
    /// `max_backoff`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let scaled =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        if scaled >= self.max_backoff.as_secs_f64() {
            self.max_backoff
        } else {
            Duration::from_secs_f64(scaled)
        }
    }

    /// Whether a status is a transient transport failure that a later
    /// attempt can outlive.
    ///
    /// This is the metadata-probe predicate. Read-side scopes retry every
    /// status and do not consult it.
    pub fn is_retryable(&self, status: &Status) -> bool {
        use tonic::Code;

        matches!(
            status.code(),
            Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted | Code::Internal
        )
    }

    /// Start an attempt counter against this policy.
    pub fn backoff_state(&self) -> Backoff {
        Backoff {
            policy: self.clone(),
            attempt: 0,
        }
    }
}

/// Stateful attempt counter for in-method retry loops.
///
/// Used where the retry body must mutate surrounding state between attempts
/// (stub eviction and recreation), which a closure-based executor cannot
/// express without fighting the borrow checker.
#[derive(Debug)]
pub struct Backoff {
    policy: RetryPolicy,
    attempt: usize,
}

impl Backoff {
    /// Next backoff delay, or `None` when the budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.backoff(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    /// Re-attempts consumed so far.
    pub fn attempt(&self) -> usize {
        self.attempt
    }
}

/// Retry an idempotent operation with exponential backoff.
///
/// `retryable` decides whether an error is worth another attempt; a terminal
/// error returns immediately without touching the budget. When the budget is
/// exhausted the last error is returned.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    retryable: P,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut backoff = policy.backoff_state();

    loop {
        match operation().await {
            Ok(result) => {
                if backoff.attempt() > 0 {
                    debug!(
                        attempts = backoff.attempt() + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if !retryable(&error) {
                    warn!(error = %error, "Terminal error, not retrying");
                    return Err(error);
                }
                match backoff.next_delay() {
                    Some(delay) => {
                        warn!(
                            attempt = backoff.attempt(),
                            max_retries = policy.max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            error = %error,
                            "Transient failure, backing off"
                        );
                        sleep(delay).await;
                    }
                    None => {
                        warn!(
                            attempts = policy.max_retries + 1,
                            error = %error,
                            "Retry budget exhausted, giving up"
                        );
                        return Err(error);
                    }
                }
            }
        }
    }
}
