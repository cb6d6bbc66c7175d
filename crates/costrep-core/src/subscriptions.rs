//! Subscription enumeration: from the management API or a fixed list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CostApiConfig;
use crate::http::{HttpRequest, HttpTransport};
use crate::identity::AccessToken;

/// One subscription to report on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Subscription {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Supplies the ordered list of subscriptions for a run.
pub trait SubscriptionSource {
    fn list(&self, token: &AccessToken) -> Result<Vec<Subscription>>;
}

/// Fixed list from configuration.
#[derive(Debug, Clone)]
pub struct StaticSubscriptions(pub Vec<Subscription>);

impl SubscriptionSource for StaticSubscriptions {
    fn list(&self, _token: &AccessToken) -> Result<Vec<Subscription>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionPage {
    #[serde(default)]
    value: Vec<SubscriptionEntry>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionEntry {
    #[serde(rename = "subscriptionId")]
    subscription_id: String,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
}

/// Upper bound on followed `nextLink` pages.
const MAX_PAGES: usize = 100;

/// Lists subscriptions visible to the token via `GET /subscriptions`, following `nextLink`.
pub struct ApiSubscriptions<'a> {
    transport: &'a dyn HttpTransport,
    api: &'a CostApiConfig,
}

impl<'a> ApiSubscriptions<'a> {
    pub fn new(transport: &'a dyn HttpTransport, api: &'a CostApiConfig) -> Self {
        Self { transport, api }
    }

    fn first_page_url(&self) -> String {
        format!(
            "{}/subscriptions?api-version={}",
            self.api.management_endpoint.trim_end_matches('/'),
            self.api.subscriptions_api_version
        )
    }
}

impl SubscriptionSource for ApiSubscriptions<'_> {
    fn list(&self, token: &AccessToken) -> Result<Vec<Subscription>> {
        let mut subs = Vec::new();
        let mut next = Some(self.first_page_url());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                anyhow::bail!("subscription listing exceeded {} pages", MAX_PAGES);
            }
            let request = HttpRequest::get(url.as_str()).bearer(token.secret());
            let response = self
                .transport
                .send(&request)
                .context("list subscriptions request failed")?;
            if !response.is_success() {
                anyhow::bail!(
                    "list subscriptions returned HTTP {}: {}",
                    response.status,
                    response.body_text()
                );
            }
            let page: SubscriptionPage = serde_json::from_slice(&response.body)
                .context("parse subscription list response")?;
            subs.extend(page.value.into_iter().map(|e| {
                let name = e.display_name.unwrap_or_else(|| e.subscription_id.clone());
                Subscription::new(e.subscription_id, name)
            }));
            next = page.next_link.filter(|l| !l.is_empty());
        }

        tracing::debug!(count = subs.len(), pages, "enumerated subscriptions");
        Ok(subs)
    }
}
