//! Per-subscription collection: Actual, cooldown, Amortized.

use std::time::Duration;

use crate::cost::{CostQueryClient, CostQueryResult, CostValue, MetricKind};
use crate::identity::AccessToken;
use crate::pacer::Pacer;
use crate::period::BillingPeriod;
use crate::report::SubscriptionCostRecord;
use crate::subscriptions::Subscription;

/// Collect both metrics for one subscription into a record.
///
/// Never fails: a query that cannot produce a value leaves the error sentinel
/// in its column. The cooldown between the two queries is always taken.
pub fn collect_subscription(
    client: &mut CostQueryClient<'_>,
    pacer: &dyn Pacer,
    subscription: &Subscription,
    period: BillingPeriod,
    token: &AccessToken,
    inter_query_delay: Duration,
) -> SubscriptionCostRecord {
    let actual = resolve(client, subscription, period, MetricKind::Actual, token);
    pacer.pause(inter_query_delay);
    let amortized = resolve(client, subscription, period, MetricKind::Amortized, token);

    let currency = actual.currency.clone().or_else(|| amortized.currency.clone());

    SubscriptionCostRecord {
        subscription_id: subscription.id.clone(),
        display_name: subscription.display_name.clone(),
        period,
        actual_cost: actual.value,
        amortized_cost: amortized.value,
        currency,
    }
}

fn resolve(
    client: &mut CostQueryClient<'_>,
    subscription: &Subscription,
    period: BillingPeriod,
    kind: MetricKind,
    token: &AccessToken,
) -> CostQueryResult {
    match client.query(&subscription.id, period, kind, token) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                subscription = %subscription.id,
                metric = %kind,
                error = %e,
                "unexpected cost query response; recording error"
            );
            CostQueryResult {
                kind,
                value: CostValue::Error,
                currency: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostApiConfig;
    use crate::http::ScriptedTransport;
    use crate::pacer::RecordingPacer;
    use crate::retry::RetryPolicy;

    fn rows(cost: f64, currency: &str) -> String {
        format!(r#"{{"properties":{{"rows":[[{},"{}"]]}}}}"#, cost, currency)
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_delay_secs: 1.0,
        }
    }

    #[test]
    fn both_metrics_and_cooldown() {
        let t = ScriptedTransport::new()
            .respond_json(200, &rows(100.0, "EUR"))
            .respond_json(200, &rows(80.0, "EUR"));
        let pacer = RecordingPacer::default();
        let api = CostApiConfig::default();
        let mut client = CostQueryClient::new(&t, &pacer, &api, policy()).with_seed(1);
        let sub = Subscription::new("s1", "Prod");
        let rec = collect_subscription(
            &mut client,
            &pacer,
            &sub,
            BillingPeriod::new(2024, 3).unwrap(),
            &AccessToken::new("tok"),
            Duration::from_secs(3),
        );
        assert_eq!(rec.actual_cost, CostValue::Amount(100.0));
        assert_eq!(rec.amortized_cost, CostValue::Amount(80.0));
        assert_eq!(rec.currency.as_deref(), Some("EUR"));
        assert_eq!(rec.display_name, "Prod");
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(3)]);
    }

    #[test]
    fn cooldown_taken_even_when_first_query_fails() {
        let t = ScriptedTransport::new()
            .respond_json(400, "bad request")
            .respond_json(200, &rows(5.0, "USD"));
        let pacer = RecordingPacer::default();
        let api = CostApiConfig::default();
        let mut client = CostQueryClient::new(&t, &pacer, &api, policy()).with_seed(1);
        let rec = collect_subscription(
            &mut client,
            &pacer,
            &Subscription::new("s1", "Prod"),
            BillingPeriod::new(2024, 3).unwrap(),
            &AccessToken::new("tok"),
            Duration::from_secs(3),
        );
        assert_eq!(rec.actual_cost, CostValue::Error);
        assert_eq!(rec.amortized_cost, CostValue::Amount(5.0));
        // Currency comes from the second query when the first has none.
        assert_eq!(rec.currency.as_deref(), Some("USD"));
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(3)]);
    }

    #[test]
    fn malformed_response_becomes_sentinel() {
        let t = ScriptedTransport::new()
            .respond_json(200, &rows(7.0, "USD"))
            .respond_json(200, r#"{"properties":{"rows":[["oops"]]}}"#);
        let pacer = RecordingPacer::default();
        let api = CostApiConfig::default();
        let mut client = CostQueryClient::new(&t, &pacer, &api, policy()).with_seed(1);
        let rec = collect_subscription(
            &mut client,
            &pacer,
            &Subscription::new("s1", "Prod"),
            BillingPeriod::new(2024, 3).unwrap(),
            &AccessToken::new("tok"),
            Duration::ZERO,
        );
        assert_eq!(rec.actual_cost, CostValue::Amount(7.0));
        assert_eq!(rec.amortized_cost, CostValue::Error);
        assert_eq!(rec.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn first_known_currency_wins() {
        let t = ScriptedTransport::new()
            .respond_json(200, &rows(1.0, "USD"))
            .respond_json(200, &rows(1.0, "EUR"));
        let pacer = RecordingPacer::default();
        let api = CostApiConfig::default();
        let mut client = CostQueryClient::new(&t, &pacer, &api, policy()).with_seed(1);
        let rec = collect_subscription(
            &mut client,
            &pacer,
            &Subscription::new("s1", "Prod"),
            BillingPeriod::new(2024, 3).unwrap(),
            &AccessToken::new("tok"),
            Duration::ZERO,
        );
        assert_eq!(rec.currency.as_deref(), Some("USD"));
    }
}
