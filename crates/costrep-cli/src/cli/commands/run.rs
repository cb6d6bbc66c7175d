//! `costrep run` – collect last month's costs and deliver the report.

use anyhow::{Context, Result};
use chrono::Utc;
use costrep_core::config::CostrepConfig;
use costrep_core::delivery::DeliveryOutcome;
use costrep_core::job::{self, JobOptions, JobOutcome};
use costrep_core::report::to_csv;

pub async fn run_report(cfg: CostrepConfig, deliver: bool, print: bool) -> Result<()> {
    let today = Utc::now().date_naive();
    let options = JobOptions {
        deliver,
        jitter_seed: None,
    };

    // The batch blocks on HTTP and on its own cooldowns.
    let outcome = tokio::task::spawn_blocking(move || job::run_monthly(&cfg, today, options))
        .await
        .context("report task did not complete")??;

    match outcome {
        JobOutcome::NoSubscriptions => {
            eprintln!("No subscriptions found; nothing to report.");
            Ok(())
        }
        JobOutcome::Completed { report, delivery } => {
            if print {
                print!("{}", to_csv(&report));
            }
            eprintln!(
                "{}: {} subscription(s), {} error cell(s), delivery {}",
                report.period(),
                report.len(),
                report.error_cells(),
                delivery
            );
            match delivery {
                DeliveryOutcome::Failed(e) => {
                    Err(anyhow::Error::new(e).context("report delivery failed"))
                }
                DeliveryOutcome::Delivered { .. } | DeliveryOutcome::Skipped => Ok(()),
            }
        }
    }
}
