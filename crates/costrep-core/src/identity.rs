//! Access token acquisition.
//!
//! The token is obtained once per run and shared read-only with every query.
//! There is no refresh-on-expiry.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;

use crate::config::IdentityConfig;
use crate::http::{HttpRequest, HttpTransport};

/// Bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

pub trait TokenSource {
    fn access_token(&self) -> Result<AccessToken>;
}

/// Token fixed in configuration or the environment.
#[derive(Debug, Clone)]
pub struct StaticToken(pub AccessToken);

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<AccessToken> {
        if self.0.secret().trim().is_empty() {
            anyhow::bail!("configured access token is empty");
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Managed identity token from the instance metadata endpoint.
pub struct MetadataTokenSource<'a> {
    transport: &'a dyn HttpTransport,
    config: &'a IdentityConfig,
}

impl<'a> MetadataTokenSource<'a> {
    pub fn new(transport: &'a dyn HttpTransport, config: &'a IdentityConfig) -> Self {
        Self { transport, config }
    }

    fn token_url(&self) -> Result<String> {
        let mut params = vec![
            ("api-version", self.config.api_version.as_str()),
            ("resource", self.config.resource.as_str()),
        ];
        if let Some(client_id) = self.config.client_id.as_deref() {
            params.push(("client_id", client_id));
        }
        let url = url::Url::parse_with_params(&self.config.metadata_endpoint, &params)
            .with_context(|| {
                format!("invalid metadata endpoint: {}", self.config.metadata_endpoint)
            })?;
        Ok(url.into())
    }
}

impl TokenSource for MetadataTokenSource<'_> {
    fn access_token(&self) -> Result<AccessToken> {
        let request = HttpRequest::get(self.token_url()?).header("Metadata", "true");
        let response = self
            .transport
            .send(&request)
            .context("metadata token request failed")?;
        if !response.is_success() {
            anyhow::bail!(
                "metadata endpoint returned HTTP {}: {}",
                response.status,
                response.body_text()
            );
        }
        let parsed: TokenResponse =
            serde_json::from_slice(&response.body).context("parse metadata token response")?;
        if parsed.access_token.is_empty() {
            anyhow::bail!("metadata endpoint returned an empty access token");
        }
        Ok(AccessToken::new(parsed.access_token))
    }
}
