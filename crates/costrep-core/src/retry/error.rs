//! Query error types for retry classification.

use std::fmt;

use crate::http::TransportError;

/// Error returned by a single cost query attempt.
/// Used so we can classify and decide retries before resolving to a sentinel.
#[derive(Debug)]
pub enum QueryError {
    /// The request never produced an HTTP status (DNS, connect, timeout, ...).
    Transport(TransportError),
    /// Server answered with a non-2xx status.
    Http {
        status: u32,
        /// Raw `Retry-After` header, if any.
        retry_after: Option<String>,
        body: String,
    },
    /// 2xx response whose body does not match the expected schema.
    Malformed(MalformedResponse),
}

impl QueryError {
    /// HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u32> {
        match self {
            QueryError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<&str> {
        match self {
            QueryError::Http { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Transport(e) => write!(f, "transport: {}", e),
            QueryError::Http { status, body, .. } => write!(f, "HTTP {}: {}", status, body),
            QueryError::Malformed(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Transport(e) => Some(e),
            QueryError::Malformed(e) => Some(e),
            QueryError::Http { .. } => None,
        }
    }
}

/// A successful response whose body does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedResponse {
    reason: String,
}

impl MalformedResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed response: {}", self.reason)
    }
}

impl std::error::Error for MalformedResponse {}
