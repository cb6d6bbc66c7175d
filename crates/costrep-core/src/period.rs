//! Billing period: one full calendar month.

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;

/// A calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    first_day: NaiveDate,
}

impl BillingPeriod {
    /// Returns `None` for an invalid month or an out-of-range year.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    /// The calendar month before the one containing `today`.
    pub fn previous_month(today: NaiveDate) -> Self {
        let last_of_previous = today - Days::new(u64::from(today.day()));
        let first_day = last_of_previous - Days::new(u64::from(last_of_previous.day0()));
        Self { first_day }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        // Day 32 counted from the 1st always lands in the following month.
        let probe = self.first_day + Days::new(31);
        let next_first = probe - Days::new(u64::from(probe.day0()));
        next_first - Days::new(1)
    }

    /// Start of the query window: first day, 00:00:00.
    pub fn time_from(&self) -> String {
        format!("{}T00:00:00Z", self.first_day.format("%Y-%m-%d"))
    }

    /// End of the query window (inclusive): last day, 23:59:59.
    pub fn time_to(&self) -> String {
        format!("{}T23:59:59Z", self.last_day().format("%Y-%m-%d"))
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}
