//! Classify HTTP status and query errors into retry policy error kinds.

use super::error::QueryError;

/// High-level classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server asked us to slow down (429).
    Throttled,
    /// Anything else; never retried.
    Other,
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 => ErrorKind::Throttled,
        _ => ErrorKind::Other,
    }
}

/// Classify a query error. Only a 429 response is retryable; transport
/// failures have no inspectable status and are treated as non-retryable.
pub fn classify(e: &QueryError) -> ErrorKind {
    match e {
        QueryError::Http { status, .. } => classify_http_status(*status),
        QueryError::Transport(_) | QueryError::Malformed(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::MalformedResponse;

    #[test]
    fn http_429_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
    }

    #[test]
    fn other_statuses_not_retried() {
        for code in [400, 401, 403, 404, 500, 502, 503] {
            assert_eq!(classify_http_status(code), ErrorKind::Other, "code={code}");
        }
    }

    #[test]
    fn malformed_not_retried() {
        let e = QueryError::Malformed(MalformedResponse::new("missing properties"));
        assert_eq!(classify(&e), ErrorKind::Other);
    }
}
