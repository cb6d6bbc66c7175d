//! Cost query client: one metric, one subscription, with 429 backoff.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::request::build_query;
use super::response::{parse_query_response, CostRow};
use super::{CostQueryResult, MetricKind};
use crate::config::CostApiConfig;
use crate::http::{HttpRequest, HttpTransport};
use crate::identity::AccessToken;
use crate::pacer::Pacer;
use crate::period::BillingPeriod;
use crate::retry::{
    self, ErrorKind, MalformedResponse, QueryError, RetryFailure, RetryPolicy,
};

/// Issues cost queries. Holds the random source used for backoff jitter.
pub struct CostQueryClient<'a> {
    transport: &'a dyn HttpTransport,
    pacer: &'a dyn Pacer,
    api: &'a CostApiConfig,
    policy: RetryPolicy,
    rng: StdRng,
}

impl<'a> CostQueryClient<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        pacer: &'a dyn Pacer,
        api: &'a CostApiConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            pacer,
            api,
            policy,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for jitter (reproducible delays).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn query_url(&self, subscription_id: &str) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.CostManagement/query?api-version={}",
            self.api.management_endpoint.trim_end_matches('/'),
            subscription_id,
            self.api.api_version
        )
    }

    /// Query one metric for the whole billing month.
    ///
    /// Every HTTP failure resolves to the error sentinel: a 429 is retried with
    /// backoff until the retry ceiling, anything else stops at once. Only a
    /// successful response with an unexpected body comes back as `Err`.
    pub fn query(
        &mut self,
        subscription_id: &str,
        period: BillingPeriod,
        kind: MetricKind,
        token: &AccessToken,
    ) -> Result<CostQueryResult, MalformedResponse> {
        let span = tracing::info_span!(
            "cost_query",
            subscription = %subscription_id,
            metric = %kind,
            period = %period
        );
        let _enter = span.enter();

        let body = serde_json::to_vec(&build_query(kind, period))
            .map_err(|e| MalformedResponse::new(format!("encode query: {}", e)))?;
        let request =
            HttpRequest::post_json(self.query_url(subscription_id), body).bearer(token.secret());

        let transport = self.transport;
        let outcome = retry::run_with_retry(&self.policy, self.pacer, &mut self.rng, |attempt| {
            tracing::debug!(attempt, "sending cost query");
            send_once(transport, &request)
        });

        match outcome {
            Ok(Some(CostRow { cost, currency })) => {
                tracing::info!(
                    cost,
                    currency = currency.as_deref().unwrap_or(super::UNKNOWN_CURRENCY),
                    "cost query succeeded"
                );
                Ok(CostQueryResult::amount(kind, cost, currency))
            }
            Ok(None) => {
                // Zero rows count as zero spend, indistinguishable from an empty answer.
                tracing::info!("cost query returned no rows; recording zero");
                Ok(CostQueryResult::amount(kind, 0.0, None))
            }
            Err(RetryFailure {
                error: QueryError::Malformed(e),
                ..
            }) => Err(e),
            Err(failure) => {
                log_failure(&failure);
                Ok(CostQueryResult::error(kind))
            }
        }
    }
}

fn send_once(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
) -> Result<Option<CostRow>, QueryError> {
    let response = transport.send(request).map_err(QueryError::Transport)?;
    if !response.is_success() {
        return Err(QueryError::Http {
            status: response.status,
            retry_after: response.header("Retry-After").map(str::to_string),
            body: response.body_text(),
        });
    }
    parse_query_response(&response.body).map_err(QueryError::Malformed)
}

fn log_failure(failure: &RetryFailure) {
    tracing::error!(
        attempts = failure.attempts,
        status = ?failure.error.status(),
        error = %failure.error,
        "{}",
        failure_summary(failure)
    );
}

/// The ceiling check runs first, so a non-retryable error on the last
/// allowed attempt also ends as exhausted; only throttling counts as that.
fn failure_summary(failure: &RetryFailure) -> &'static str {
    if failure.exhausted && retry::classify(&failure.error) == ErrorKind::Throttled {
        "cost query failed after exhausting retries"
    } else {
        "cost query failed with non-retryable error"
    }
}
