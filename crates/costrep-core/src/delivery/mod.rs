//! Report delivery: serialize, spool to a transient file, upload to chat.
//!
//! The transient file is a [`tempfile::NamedTempFile`] owned by [`deliver`];
//! it is removed when that function returns, whatever the outcome.

mod schema;
mod upload;

pub use upload::{ChatUploader, UploadTicket};

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::http::{HttpTransport, TransportError};
use crate::period::BillingPeriod;
use crate::report::{to_csv, Report};

/// A fully configured delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Chat API base URL without trailing slash.
    pub api_base: String,
    pub channel_id: String,
    pub token: String,
    pub initial_comment: String,
    pub filename_prefix: String,
    pub spool_dir: Option<PathBuf>,
}

impl ChannelConfig {
    pub fn report_filename(&self, period: BillingPeriod) -> String {
        report_filename(&self.filename_prefix, period)
    }
}

/// `{prefix}_{YYYY-MM}.csv`
pub fn report_filename(prefix: &str, period: BillingPeriod) -> String {
    format!("{}_{}.csv", prefix, period)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Negotiate,
    Transfer,
    Finalize,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStep::Negotiate => write!(f, "negotiate"),
            UploadStep::Transfer => write!(f, "transfer"),
            UploadStep::Finalize => write!(f, "finalize"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("spool report file: {0}")]
    Spool(#[from] std::io::Error),
    #[error("{step}: transport failure: {source}")]
    Transport {
        step: UploadStep,
        #[source]
        source: TransportError,
    },
    #[error("{step}: HTTP {status}: {body}")]
    Status {
        step: UploadStep,
        status: u32,
        body: String,
    },
    #[error("{step}: API error: {error}")]
    Api { step: UploadStep, error: String },
    #[error("{step}: malformed reply: {reason}")]
    Malformed { step: UploadStep, reason: String },
}

impl DeliveryError {
    /// Upload step that failed, or `None` for a local spool failure.
    pub fn step(&self) -> Option<UploadStep> {
        match self {
            DeliveryError::Spool(_) => None,
            DeliveryError::Transport { step, .. }
            | DeliveryError::Status { step, .. }
            | DeliveryError::Api { step, .. }
            | DeliveryError::Malformed { step, .. } => Some(*step),
        }
    }
}

#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered { file_id: String },
    Skipped,
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered { file_id } => write!(f, "delivered ({})", file_id),
            DeliveryOutcome::Skipped => write!(f, "skipped"),
            DeliveryOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Deliver `report` to `channel`. `None` means no channel is configured.
///
/// Failures are logged and returned as [`DeliveryOutcome::Failed`]; the report
/// itself is never touched.
pub fn deliver(
    report: &Report,
    channel: Option<&ChannelConfig>,
    transport: &dyn HttpTransport,
) -> DeliveryOutcome {
    let Some(channel) = channel else {
        tracing::info!("no delivery channel configured; skipping upload");
        return DeliveryOutcome::Skipped;
    };

    match spool_and_upload(report, channel, transport) {
        Ok(file_id) => {
            tracing::info!(file_id = %file_id, channel = %channel.channel_id, "report delivered");
            DeliveryOutcome::Delivered { file_id }
        }
        Err(e) => {
            tracing::error!(step = ?e.step(), error = %e, "report delivery failed");
            DeliveryOutcome::Failed(e)
        }
    }
}

fn spool_and_upload(
    report: &Report,
    channel: &ChannelConfig,
    transport: &dyn HttpTransport,
) -> Result<String, DeliveryError> {
    let csv = to_csv(report);
    let filename = channel.report_filename(report.period());
    let file = spool(channel, report.period(), csv.as_bytes())?;
    tracing::debug!(path = %file.path().display(), bytes = csv.len(), "report spooled");

    ChatUploader::new(transport, channel).upload(file.path(), &filename, csv.len() as u64)
}

fn spool(
    channel: &ChannelConfig,
    period: BillingPeriod,
    data: &[u8],
) -> Result<NamedTempFile, DeliveryError> {
    let prefix = format!("{}_{}_", channel.filename_prefix, period);
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".csv");
    let mut file = match &channel.spool_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}
