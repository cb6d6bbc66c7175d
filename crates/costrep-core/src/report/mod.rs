//! Report: one cost record per subscription, in enumeration order.

mod csv;

pub use self::csv::{to_csv, CSV_HEADER};

use crate::cost::{CostValue, UNKNOWN_CURRENCY};
use crate::period::BillingPeriod;

/// Aggregate of both metrics for one subscription. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionCostRecord {
    pub subscription_id: String,
    pub display_name: String,
    pub period: BillingPeriod,
    pub actual_cost: CostValue,
    pub amortized_cost: CostValue,
    /// First currency reported by either query; `None` means unknown.
    pub currency: Option<String>,
}

impl SubscriptionCostRecord {
    pub fn currency_or_unknown(&self) -> &str {
        self.currency.as_deref().unwrap_or(UNKNOWN_CURRENCY)
    }

    /// Number of metrics that ended in the error sentinel (0..=2).
    pub fn error_count(&self) -> usize {
        [self.actual_cost, self.amortized_cost]
            .iter()
            .filter(|v| v.is_error())
            .count()
    }
}

/// Sums of the numeric amounts in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTotals {
    pub actual: f64,
    pub amortized: f64,
    /// Set only when every known currency in the report is the same.
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    period: BillingPeriod,
    records: Vec<SubscriptionCostRecord>,
}

impl Report {
    pub fn new(period: BillingPeriod) -> Self {
        Self {
            period,
            records: Vec::new(),
        }
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    pub fn push(&mut self, record: SubscriptionCostRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SubscriptionCostRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total error-sentinel cells across all rows.
    pub fn error_cells(&self) -> usize {
        self.records.iter().map(SubscriptionCostRecord::error_count).sum()
    }

    pub fn totals(&self) -> ReportTotals {
        let actual = self.records.iter().filter_map(|r| r.actual_cost.amount()).sum();
        let amortized = self
            .records
            .iter()
            .filter_map(|r| r.amortized_cost.amount())
            .sum();

        let mut currencies = self.records.iter().filter_map(|r| r.currency.as_deref());
        let currency = currencies
            .next()
            .filter(|first| currencies.all(|c| c == *first))
            .map(str::to_string);

        ReportTotals {
            actual,
            amortized,
            currency,
        }
    }
}

#[cfg(test)]
pub(crate) fn record(
    id: &str,
    actual: CostValue,
    amortized: CostValue,
    currency: Option<&str>,
) -> SubscriptionCostRecord {
    SubscriptionCostRecord {
        subscription_id: id.to_string(),
        display_name: format!("{} name", id),
        period: BillingPeriod::new(2024, 1).unwrap(),
        actual_cost: actual,
        amortized_cost: amortized,
        currency: currency.map(str::to_string),
    }
}
