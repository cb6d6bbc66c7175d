//! CSV rendering of a report.

use std::fmt::Write as _;

use super::Report;

pub const CSV_HEADER: [&str; 6] = [
    "SubscriptionName",
    "SubscriptionId",
    "BillingPeriod",
    "ActualCost",
    "AmortizedCost",
    "Currency",
];

/// Render the report as CSV: header, one row per subscription, then a blank
/// line and a `Total` row over the numeric amounts. An empty report renders
/// the header only.
pub fn to_csv(report: &Report) -> String {
    let mut out = String::new();
    write_row(&mut out, &CSV_HEADER);

    for r in report.records() {
        let period = r.period.to_string();
        let actual = r.actual_cost.to_string();
        let amortized = r.amortized_cost.to_string();
        write_row(
            &mut out,
            &[
                &r.display_name,
                &r.subscription_id,
                &period,
                &actual,
                &amortized,
                r.currency_or_unknown(),
            ],
        );
    }

    if !report.is_empty() {
        let t = report.totals();
        let actual = format!("{:.2}", t.actual);
        let amortized = format!("{:.2}", t.amortized);
        let period = report.period().to_string();
        out.push_str("\r\n");
        write_row(
            &mut out,
            &[
                "Total",
                "",
                &period,
                &actual,
                &amortized,
                t.currency.as_deref().unwrap_or(""),
            ],
        );
    }
    out
}

fn write_row(out: &mut String, fields: &[&str]) {
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, f);
    }
    out.push_str("\r\n");
}

fn write_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        let _ = write!(out, "\"{}\"", field.replace('"', "\"\""));
    } else {
        out.push_str(field);
    }
}
