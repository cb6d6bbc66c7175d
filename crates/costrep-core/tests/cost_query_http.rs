//! Integration tests: cost queries, subscription listing and token fetch over
//! the real curl transport against a local scripted server.

mod common;

use std::time::Duration;

use common::api_server::{ApiServer, Reply};
use common::RecordingPacer;
use costrep_core::config::{CostApiConfig, IdentityConfig};
use costrep_core::cost::{CostQueryClient, CostValue, MetricKind};
use costrep_core::http::CurlTransport;
use costrep_core::identity::{AccessToken, MetadataTokenSource, TokenSource};
use costrep_core::period::BillingPeriod;
use costrep_core::retry::RetryPolicy;
use costrep_core::subscriptions::{ApiSubscriptions, Subscription, SubscriptionSource};

fn api(server: &ApiServer) -> CostApiConfig {
    CostApiConfig {
        management_endpoint: server.url().to_string(),
        ..CostApiConfig::default()
    }
}

fn transport() -> CurlTransport {
    CurlTransport::new(Duration::from_secs(5), Duration::from_secs(10))
}

#[test]
fn throttled_query_honours_retry_after_then_succeeds() {
    let server = ApiServer::start();
    server
        .push(Reply::json(429, r#"{"error":{"code":"429"}}"#).with_header("Retry-After", "1"))
        .push(Reply::json(
            200,
            r#"{"properties":{"columns":[{"name":"Cost","type":"Number"},{"name":"Currency","type":"String"}],"rows":[[1234.567,"EUR"]]}}"#,
        ));

    let t = transport();
    let pacer = RecordingPacer::default();
    let api = api(&server);
    let policy = RetryPolicy {
        max_retries: 3,
        initial_delay_secs: 5.0,
    };
    let mut client = CostQueryClient::new(&t, &pacer, &api, policy).with_seed(11);
    let result = client
        .query(
            "sub-9",
            BillingPeriod::new(2024, 2).unwrap(),
            MetricKind::Amortized,
            &AccessToken::new("tok-xyz"),
        )
        .unwrap();

    assert_eq!(result.value, CostValue::Amount(1234.567));
    assert_eq!(result.currency.as_deref(), Some("EUR"));

    // Hint of 1s: delay in [1, 2.2).
    let pauses = pacer.pauses();
    assert_eq!(pauses.len(), 1);
    assert!(pauses[0] >= Duration::from_secs(1));
    assert!(pauses[0] < Duration::from_millis(2200));

    let reqs = server.requests();
    assert_eq!(reqs.len(), 2);
    let req = &reqs[0];
    assert_eq!(req.method, "POST");
    assert_eq!(
        req.target,
        "/subscriptions/sub-9/providers/Microsoft.CostManagement/query?api-version=2023-03-01"
    );
    assert_eq!(req.header("Authorization"), Some("Bearer tok-xyz"));
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(body["type"], "AmortizedCost");
    assert_eq!(body["timeframe"], "Custom");
    assert_eq!(body["timePeriod"]["from"], "2024-02-01T00:00:00Z");
    assert_eq!(body["timePeriod"]["to"], "2024-02-29T23:59:59Z");
}

#[test]
fn forbidden_query_is_error_without_retry() {
    let server = ApiServer::start();
    server.push(Reply::json(403, r#"{"error":{"code":"AuthorizationFailed"}}"#));

    let t = transport();
    let pacer = RecordingPacer::default();
    let api = api(&server);
    let mut client = CostQueryClient::new(&t, &pacer, &api, RetryPolicy::default());
    let result = client
        .query(
            "sub-1",
            BillingPeriod::new(2024, 2).unwrap(),
            MetricKind::Actual,
            &AccessToken::new("tok"),
        )
        .unwrap();

    assert_eq!(result.value, CostValue::Error);
    assert!(pacer.pauses().is_empty());
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn subscription_listing_follows_next_link() {
    let server = ApiServer::start();
    let next = format!("{}/subscriptions?api-version=2020-01-01&page=2", server.url());
    server
        .push(Reply::json(
            200,
            &format!(
                r#"{{"value":[{{"subscriptionId":"a","displayName":"Alpha"}}],"nextLink":"{}"}}"#,
                next
            ),
        ))
        .push(Reply::json(
            200,
            r#"{"value":[{"subscriptionId":"b","displayName":"Beta"}]}"#,
        ));

    let t = transport();
    let api = api(&server);
    let subs = ApiSubscriptions::new(&t, &api)
        .list(&AccessToken::new("tok"))
        .unwrap();
    assert_eq!(
        subs,
        vec![Subscription::new("a", "Alpha"), Subscription::new("b", "Beta")]
    );

    let reqs = server.requests();
    assert_eq!(reqs[0].target, "/subscriptions?api-version=2020-01-01");
    assert_eq!(reqs[1].target, "/subscriptions?api-version=2020-01-01&page=2");
    assert_eq!(reqs[1].header("Authorization"), Some("Bearer tok"));
}

#[test]
fn metadata_token_fetch() {
    let server = ApiServer::start();
    server.push(Reply::json(200, r#"{"access_token":"minted","expires_in":"3599"}"#));

    let t = transport();
    let cfg = IdentityConfig {
        metadata_endpoint: format!("{}/metadata/identity/oauth2/token", server.url()),
        ..IdentityConfig::default()
    };
    let token = MetadataTokenSource::new(&t, &cfg).access_token().unwrap();
    assert_eq!(token.secret(), "minted");

    let req = &server.requests()[0];
    assert_eq!(req.method, "GET");
    assert!(req.target.starts_with("/metadata/identity/oauth2/token?api-version=2018-02-01"));
    assert_eq!(req.header("Metadata"), Some("true"));
}
