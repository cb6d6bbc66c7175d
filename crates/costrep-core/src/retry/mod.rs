//! Retry and backoff policy.
//!
//! This module encapsulates error classification (throttling vs. everything
//! else) and jittered exponential backoff so the cost query client can retry
//! rate-limited requests while treating all other failures as final.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, ErrorKind};
pub use error::{MalformedResponse, QueryError};
pub use policy::{base_delay, compute_delay, parse_retry_after, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryFailure};
