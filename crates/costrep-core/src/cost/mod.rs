//! Cost queries: one metric for one subscription and billing period.

mod client;
mod request;
mod response;

pub use client::CostQueryClient;
pub use request::{build_query, QueryDefinition};
pub use response::{parse_query_response, CostRow};

use std::fmt;

/// Sentinel written wherever a metric could not be obtained.
pub const ERROR_SENTINEL: &str = "Error";
/// Currency shown when no query reported one.
pub const UNKNOWN_CURRENCY: &str = "unknown";

/// Which cost metric to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Actual,
    Amortized,
}

impl MetricKind {
    /// Value of the query `type` field.
    pub fn api_type(&self) -> &'static str {
        match self {
            MetricKind::Actual => "ActualCost",
            MetricKind::Amortized => "AmortizedCost",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Actual => write!(f, "Actual"),
            MetricKind::Amortized => write!(f, "Amortized"),
        }
    }
}

/// Cost of one metric: an amount, or the error sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostValue {
    Amount(f64),
    Error,
}

impl CostValue {
    pub fn amount(&self) -> Option<f64> {
        match self {
            CostValue::Amount(v) => Some(*v),
            CostValue::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CostValue::Error)
    }
}

impl fmt::Display for CostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostValue::Amount(v) => write!(f, "{:.2}", v),
            CostValue::Error => write!(f, "{}", ERROR_SENTINEL),
        }
    }
}

/// Terminal outcome of one metric query.
#[derive(Debug, Clone, PartialEq)]
pub struct CostQueryResult {
    pub kind: MetricKind,
    pub value: CostValue,
    /// `None` means unknown.
    pub currency: Option<String>,
}

impl CostQueryResult {
    pub fn amount(kind: MetricKind, value: f64, currency: Option<String>) -> Self {
        Self {
            kind,
            value: CostValue::Amount(value),
            currency,
        }
    }

    pub fn error(kind: MetricKind) -> Self {
        Self {
            kind,
            value: CostValue::Error,
            currency: None,
        }
    }

    pub fn currency_or_unknown(&self) -> &str {
        self.currency.as_deref().unwrap_or(UNKNOWN_CURRENCY)
    }
}
