//! The monthly job: token, subscriptions, batch, delivery.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

use crate::batch::run_batch;
use crate::config::CostrepConfig;
use crate::cost::CostQueryClient;
use crate::delivery::{deliver, DeliveryOutcome};
use crate::http::{CurlTransport, HttpTransport};
use crate::identity::{AccessToken, MetadataTokenSource, StaticToken, TokenSource};
use crate::pacer::{Pacer, ThreadPacer};
use crate::period::BillingPeriod;
use crate::report::Report;
use crate::subscriptions::{
    ApiSubscriptions, StaticSubscriptions, Subscription, SubscriptionSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    /// Upload the report when a channel is configured.
    pub deliver: bool,
    /// Fixed seed for backoff jitter; entropy when `None`.
    pub jitter_seed: Option<u64>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            deliver: true,
            jitter_seed: None,
        }
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    /// Enumeration returned nothing; no queries were made and nothing was delivered.
    NoSubscriptions,
    Completed {
        report: Report,
        delivery: DeliveryOutcome,
    },
}

/// External collaborators for one run.
pub struct JobDeps<'a> {
    pub transport: &'a dyn HttpTransport,
    pub pacer: &'a dyn Pacer,
    pub tokens: &'a dyn TokenSource,
    pub subscriptions: &'a dyn SubscriptionSource,
}

/// Run the job for `period`.
///
/// Token acquisition and subscription enumeration failures are fatal and
/// returned as `Err`. Everything after that point resolves into the outcome.
pub fn run_job(
    cfg: &CostrepConfig,
    period: BillingPeriod,
    deps: &JobDeps<'_>,
    options: JobOptions,
) -> Result<JobOutcome> {
    tracing::info!(period = %period, "starting cost report run");

    let token = deps
        .tokens
        .access_token()
        .context("acquire access token")?;
    let subscriptions = deps
        .subscriptions
        .list(&token)
        .context("enumerate subscriptions")?;

    if subscriptions.is_empty() {
        tracing::warn!("no subscriptions found; nothing to report");
        return Ok(JobOutcome::NoSubscriptions);
    }
    tracing::info!(count = subscriptions.len(), "subscriptions to process");

    let report = collect(cfg, period, deps, &token, &subscriptions, options);

    let delivery = if options.deliver {
        let channel = cfg.delivery.channel();
        deliver(&report, channel.as_ref(), deps.transport)
    } else {
        tracing::info!("delivery disabled for this run");
        DeliveryOutcome::Skipped
    };

    tracing::info!(
        period = %period,
        rows = report.len(),
        error_cells = report.error_cells(),
        delivery = %delivery,
        "cost report run finished"
    );

    Ok(JobOutcome::Completed { report, delivery })
}

fn collect(
    cfg: &CostrepConfig,
    period: BillingPeriod,
    deps: &JobDeps<'_>,
    token: &AccessToken,
    subscriptions: &[Subscription],
    options: JobOptions,
) -> Report {
    let mut client =
        CostQueryClient::new(deps.transport, deps.pacer, &cfg.cost_api, cfg.retry.policy());
    if let Some(seed) = options.jitter_seed {
        client = client.with_seed(seed);
    }
    run_batch(
        &mut client,
        deps.pacer,
        &cfg.throttle,
        subscriptions,
        period,
        token,
    )
}

/// Run the job for the month before `today` with production collaborators.
pub fn run_monthly(
    cfg: &CostrepConfig,
    today: NaiveDate,
    options: JobOptions,
) -> Result<JobOutcome> {
    let period = BillingPeriod::previous_month(today);
    let transport = CurlTransport::new(
        Duration::from_secs(cfg.cost_api.connect_timeout_secs),
        Duration::from_secs(cfg.cost_api.timeout_secs),
    );
    let pacer = ThreadPacer;

    // A blank configured token means "not configured": use the metadata endpoint.
    let static_token = cfg
        .identity
        .static_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| StaticToken(AccessToken::new(t)));
    let metadata = MetadataTokenSource::new(&transport, &cfg.identity);
    let tokens: &dyn TokenSource = match &static_token {
        Some(t) => t,
        None => &metadata,
    };

    let static_subs = cfg.subscriptions.clone().map(StaticSubscriptions);
    let api_subs = ApiSubscriptions::new(&transport, &cfg.cost_api);
    let subscriptions: &dyn SubscriptionSource = match &static_subs {
        Some(s) => s,
        None => &api_subs,
    };

    let deps = JobDeps {
        transport: &transport,
        pacer: &pacer,
        tokens,
        subscriptions,
    };
    run_job(cfg, period, &deps, options)
}
