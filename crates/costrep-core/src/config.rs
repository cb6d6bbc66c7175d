use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::delivery::ChannelConfig;
use crate::retry::RetryPolicy;
use crate::subscriptions::Subscription;

/// Retry policy parameters for cost queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (a query makes at most `max_retries + 1` attempts).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff when the API sends no `Retry-After`.
    pub initial_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_retries: p.max_retries,
            initial_delay_secs: p.initial_delay_secs,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay_secs: self.initial_delay_secs,
        }
    }
}

/// Self-imposed cooldowns between queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause between the Actual and Amortized query of one subscription.
    pub inter_query_delay_secs: f64,
    /// Pause between two subscriptions (not after the last).
    pub inter_subscription_delay_secs: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            inter_query_delay_secs: 2.0,
            inter_subscription_delay_secs: 5.0,
        }
    }
}

impl ThrottleConfig {
    pub fn inter_query_delay(&self) -> Duration {
        secs_to_duration(self.inter_query_delay_secs)
    }

    pub fn inter_subscription_delay(&self) -> Duration {
        secs_to_duration(self.inter_subscription_delay_secs)
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

/// Cost management API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostApiConfig {
    pub management_endpoint: String,
    /// `api-version` for the cost query endpoint.
    pub api_version: String,
    /// `api-version` for subscription enumeration.
    pub subscriptions_api_version: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for CostApiConfig {
    fn default() -> Self {
        Self {
            management_endpoint: "https://management.azure.com".to_string(),
            api_version: "2023-03-01".to_string(),
            subscriptions_api_version: "2020-01-01".to_string(),
            connect_timeout_secs: 15,
            timeout_secs: 60,
        }
    }
}

/// Access token source: instance metadata endpoint unless a static token is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub metadata_endpoint: String,
    pub api_version: String,
    pub resource: String,
    /// Client id of a user-assigned managed identity.
    pub client_id: Option<String>,
    /// Skip the metadata endpoint and use this bearer token.
    pub static_token: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            metadata_endpoint: "http://169.254.169.254/metadata/identity/oauth2/token".to_string(),
            api_version: "2018-02-01".to_string(),
            resource: "https://management.azure.com/".to_string(),
            client_id: None,
            static_token: None,
        }
    }
}

/// Chat delivery channel. Delivery is skipped unless both `channel_id` and `token` are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub api_base: String,
    pub channel_id: Option<String>,
    pub token: Option<String>,
    pub initial_comment: String,
    /// Report file name is `{filename_prefix}_{YYYY-MM}.csv`.
    pub filename_prefix: String,
    /// Directory for the transient report file (system temp dir if unset).
    pub spool_dir: Option<PathBuf>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://slack.com/api".to_string(),
            channel_id: None,
            token: None,
            initial_comment: "Monthly cloud cost report".to_string(),
            filename_prefix: "cloud_cost".to_string(),
            spool_dir: None,
        }
    }
}

impl DeliveryConfig {
    /// The configured channel, or `None` when delivery is not set up.
    pub fn channel(&self) -> Option<ChannelConfig> {
        let channel_id = self.channel_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(ChannelConfig {
            api_base: self.api_base.trim_end_matches('/').to_string(),
            channel_id: channel_id.to_string(),
            token: token.to_string(),
            initial_comment: self.initial_comment.clone(),
            filename_prefix: self.filename_prefix.clone(),
            spool_dir: self.spool_dir.clone(),
        })
    }
}

/// Global configuration loaded from `~/.config/costrep/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostrepConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub cost_api: CostApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Fixed subscription list; when absent, subscriptions are enumerated from the API.
    #[serde(default)]
    pub subscriptions: Option<Vec<Subscription>>,
}

/// Environment variables that override secrets from the config file.
pub const ENV_CHAT_TOKEN: &str = "COSTREP_CHAT_TOKEN";
pub const ENV_CHAT_CHANNEL: &str = "COSTREP_CHAT_CHANNEL";
pub const ENV_ACCESS_TOKEN: &str = "COSTREP_ACCESS_TOKEN";

impl CostrepConfig {
    /// Reject values that would make delays meaningless.
    pub fn validate(&self) -> Result<()> {
        let r = &self.retry;
        if !(r.initial_delay_secs.is_finite() && r.initial_delay_secs > 0.0) {
            anyhow::bail!(
                "retry.initial_delay_secs must be a positive number, got {}",
                r.initial_delay_secs
            );
        }
        for (name, v) in [
            ("throttle.inter_query_delay_secs", self.throttle.inter_query_delay_secs),
            (
                "throttle.inter_subscription_delay_secs",
                self.throttle.inter_subscription_delay_secs,
            ),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                anyhow::bail!("{} must be zero or positive, got {}", name, v);
            }
        }
        if self.cost_api.management_endpoint.trim().is_empty() {
            anyhow::bail!("cost_api.management_endpoint is empty");
        }
        Ok(())
    }

    /// Apply secret overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_CHAT_TOKEN) {
            self.delivery.token = Some(v);
        }
        if let Some(v) = non_empty(ENV_CHAT_CHANNEL) {
            self.delivery.channel_id = Some(v);
        }
        if let Some(v) = non_empty(ENV_ACCESS_TOKEN) {
            self.identity.static_token = Some(v);
        }
    }

    /// Copy with secrets replaced by a placeholder, for display.
    pub fn redacted(&self) -> CostrepConfig {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        let mut cfg = self.clone();
        cfg.delivery.token = mask(&self.delivery.token);
        cfg.identity.static_token = mask(&self.identity.static_token);
        cfg
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config")
    }
}

const REDACTED: &str = "***";

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("costrep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists,
/// then apply environment overrides and validate.
pub fn load_or_init() -> Result<CostrepConfig> {
    let path = config_path()?;
    let mut cfg = load_or_init_at(&path)?;
    cfg.apply_env_overrides(|name| std::env::var(name).ok());
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `path`, writing defaults there first if it does not exist.
pub fn load_or_init_at(path: &Path) -> Result<CostrepConfig> {
    if !path.exists() {
        let default_cfg = CostrepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg).context("serialize default config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir: {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CostrepConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
