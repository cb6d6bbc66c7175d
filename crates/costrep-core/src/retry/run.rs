//! Retry loop: run an attempt until it succeeds or the policy says stop.

use rand::Rng;

use super::classify;
use super::error::QueryError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::pacer::Pacer;

/// Why the retry loop gave up.
#[derive(Debug)]
pub struct RetryFailure {
    /// Error from the last attempt.
    pub error: QueryError,
    /// Attempts made, including the failing one.
    pub attempts: u32,
    /// True when the final allowed attempt failed; false for a non-retryable error.
    pub exhausted: bool,
}

/// Runs `f` (called with the 1-based attempt number) until it succeeds or the
/// retry policy says to stop. On a throttled failure, waits through `pacer`
/// for the backoff delay then tries again. No other branch waits.
pub fn run_with_retry<T, F, R>(
    policy: &RetryPolicy,
    pacer: &dyn Pacer,
    rng: &mut R,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Result<T, QueryError>,
    R: Rng + ?Sized,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind, e.retry_after(), rng) {
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            max_attempts = policy.max_attempts(),
                            delay_secs = d.as_secs_f64(),
                            retry_after = e.retry_after().unwrap_or("-"),
                            "rate limited; backing off"
                        );
                        pacer.pause(d);
                        attempt += 1;
                    }
                    RetryDecision::Exhausted => {
                        return Err(RetryFailure {
                            error: e,
                            attempts: attempt,
                            exhausted: true,
                        })
                    }
                    RetryDecision::NoRetry => {
                        return Err(RetryFailure {
                            error: e,
                            attempts: attempt,
                            exhausted: false,
                        })
                    }
                }
            }
        }
    }
}
