use rand::Rng;
use std::time::Duration;

use super::classify::ErrorKind;

/// Floor for any computed delay, in seconds.
const MIN_DELAY_SECS: f64 = 1.0;
/// Jitter spread around the base delay (±20%).
const JITTER: f64 = 0.2;
/// Exponent cap so `initial * 2^(attempt-1)` stays finite for absurd attempt counts.
const MAX_EXPONENT: u32 = 30;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Final attempt failed; the retry budget is spent.
    Exhausted,
    /// This error is not worth retrying.
    NoRetry,
}

/// Retry ceiling and initial delay for one query's retry loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a query makes at most `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Base delay in seconds for attempt 1 when the server sends no hint.
    pub initial_delay_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_secs: 5.0,
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    ///
    /// The final-attempt check comes first: once `attempt > max_retries` nothing
    /// is retried, whatever the error.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        kind: ErrorKind,
        retry_after: Option<&str>,
        rng: &mut R,
    ) -> RetryDecision {
        if attempt > self.max_retries {
            return RetryDecision::Exhausted;
        }
        match kind {
            ErrorKind::Throttled => {
                let secs = compute_delay(attempt, retry_after, self.initial_delay_secs, rng);
                RetryDecision::RetryAfter(
                    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
                )
            }
            ErrorKind::Other => RetryDecision::NoRetry,
        }
    }
}

/// Parse a `Retry-After` value given in whole seconds. Only positive integers count.
pub fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|&secs| secs > 0)
}

/// Base delay before jitter: the provider hint when usable, else
/// `initial_delay * 2^(attempt-1)`.
pub fn base_delay(attempt: u32, retry_after: Option<&str>, initial_delay_secs: f64) -> f64 {
    if let Some(secs) = retry_after.and_then(parse_retry_after) {
        return secs as f64;
    }
    let exp = attempt.saturating_sub(1).min(MAX_EXPONENT);
    initial_delay_secs * f64::from(1u32 << exp)
}

/// Delay in seconds for `attempt`, drawn uniformly from
/// `[max(1, 0.8*base), max(0.8*base + 1, 1.2*base + 1))`.
pub fn compute_delay<R: Rng + ?Sized>(
    attempt: u32,
    retry_after: Option<&str>,
    initial_delay_secs: f64,
    rng: &mut R,
) -> f64 {
    let base = base_delay(attempt, retry_after, initial_delay_secs);
    let low = (base * (1.0 - JITTER)).max(MIN_DELAY_SECS);
    let high = (base * (1.0 - JITTER) + 1.0).max(base * (1.0 + JITTER) + 1.0);
    if high <= low {
        return low;
    }
    rng.gen_range(low..high)
}
