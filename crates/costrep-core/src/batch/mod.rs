//! Batch orchestration: walk all subscriptions serially.
//!
//! Strict seriality is what keeps the run under the provider's rate limits;
//! there is no parallel path.

mod subscription;

pub use subscription::collect_subscription;

use crate::config::ThrottleConfig;
use crate::cost::CostQueryClient;
use crate::identity::AccessToken;
use crate::pacer::Pacer;
use crate::period::BillingPeriod;
use crate::report::Report;
use crate::subscriptions::Subscription;

/// Collect a record for every subscription, in the order given.
///
/// Each subscription yields exactly one record, errors included. The
/// inter-subscription cooldown is taken between subscriptions, not after the
/// last one. An empty list yields an empty report.
pub fn run_batch(
    client: &mut CostQueryClient<'_>,
    pacer: &dyn Pacer,
    throttle: &ThrottleConfig,
    subscriptions: &[Subscription],
    period: BillingPeriod,
    token: &AccessToken,
) -> Report {
    let mut report = Report::new(period);
    let total = subscriptions.len();

    for (i, sub) in subscriptions.iter().enumerate() {
        if i > 0 {
            pacer.pause(throttle.inter_subscription_delay());
        }
        tracing::info!(
            "processing subscription {}/{}: {} ({})",
            i + 1,
            total,
            sub.display_name,
            sub.id
        );
        let record = collect_subscription(
            client,
            pacer,
            sub,
            period,
            token,
            throttle.inter_query_delay(),
        );
        tracing::info!(
            subscription = %sub.id,
            actual = %record.actual_cost,
            amortized = %record.amortized_cost,
            currency = record.currency_or_unknown(),
            "subscription done"
        );
        report.push(record);
    }

    report
}
