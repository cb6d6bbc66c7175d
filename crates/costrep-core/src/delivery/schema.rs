//! Chat API payloads for the external upload flow.

use serde::{Deserialize, Serialize};

/// Reply to `files.getUploadURLExternal`.
#[derive(Debug, Deserialize)]
pub(crate) struct NegotiateReply {
    pub ok: bool,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply to `files.completeUploadExternal` (only the status fields are read).
#[derive(Debug, Deserialize)]
pub(crate) struct FinalizeReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FinalizeRequest<'a> {
    pub files: [FinalizeFile<'a>; 1],
    pub channel_id: &'a str,
    pub initial_comment: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct FinalizeFile<'a> {
    pub id: &'a str,
    pub title: &'a str,
}
