//! Three-step external file upload: negotiate, transfer, finalize.
//!
//! Steps run strictly in order and are never retried. A failure at any step
//! stops the flow; an upload URL obtained before a later failure is simply
//! abandoned.

use std::path::Path;

use serde::de::DeserializeOwned;

use super::schema::{FinalizeFile, FinalizeReply, FinalizeRequest, NegotiateReply};
use super::{ChannelConfig, DeliveryError, UploadStep};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

/// Upload URL and file id handed out by the negotiate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub upload_url: String,
    pub file_id: String,
}

pub struct ChatUploader<'a> {
    transport: &'a dyn HttpTransport,
    channel: &'a ChannelConfig,
}

impl<'a> ChatUploader<'a> {
    pub fn new(transport: &'a dyn HttpTransport, channel: &'a ChannelConfig) -> Self {
        Self { transport, channel }
    }

    /// Run all three steps for the file at `path`. Returns the file id.
    pub fn upload(
        &self,
        path: &Path,
        filename: &str,
        length: u64,
    ) -> Result<String, DeliveryError> {
        let ticket = self.negotiate(filename, length)?;
        tracing::debug!(file_id = %ticket.file_id, "upload url obtained");
        self.transfer(&ticket, path, filename)?;
        self.finalize(&ticket, filename)?;
        Ok(ticket.file_id)
    }

    pub fn negotiate(&self, filename: &str, length: u64) -> Result<UploadTicket, DeliveryError> {
        let step = UploadStep::Negotiate;
        let length = length.to_string();
        let url = url::Url::parse_with_params(
            &format!("{}/files.getUploadURLExternal", self.channel.api_base),
            &[("filename", filename), ("length", length.as_str())],
        )
        .map_err(|e| DeliveryError::Malformed {
            step,
            reason: format!("bad api_base: {}", e),
        })?;

        let request = HttpRequest::get(url.as_str()).bearer(&self.channel.token);
        let response = self.send(step, &request)?;
        let reply: NegotiateReply = parse_reply(step, &response)?;
        if !reply.ok {
            return Err(api_error(step, reply.error));
        }
        match (reply.upload_url, reply.file_id) {
            (Some(upload_url), Some(file_id)) => Ok(UploadTicket {
                upload_url,
                file_id,
            }),
            _ => Err(DeliveryError::Malformed {
                step,
                reason: "reply lacks upload_url or file_id".to_string(),
            }),
        }
    }

    /// Multipart POST of the file bytes. The upload URL is pre-signed: no auth header.
    pub fn transfer(
        &self,
        ticket: &UploadTicket,
        path: &Path,
        filename: &str,
    ) -> Result<(), DeliveryError> {
        let request = HttpRequest::post_file(
            ticket.upload_url.as_str(),
            "file",
            path.to_path_buf(),
            filename,
            "text/csv",
        );
        self.send(UploadStep::Transfer, &request)?;
        Ok(())
    }

    pub fn finalize(&self, ticket: &UploadTicket, title: &str) -> Result<(), DeliveryError> {
        let step = UploadStep::Finalize;
        let body = FinalizeRequest {
            files: [FinalizeFile {
                id: &ticket.file_id,
                title,
            }],
            channel_id: &self.channel.channel_id,
            initial_comment: &self.channel.initial_comment,
        };
        let data = serde_json::to_vec(&body).map_err(|e| DeliveryError::Malformed {
            step,
            reason: format!("encode request: {}", e),
        })?;
        let request = HttpRequest::post_json(
            format!("{}/files.completeUploadExternal", self.channel.api_base),
            data,
        )
        .bearer(&self.channel.token);

        let response = self.send(step, &request)?;
        let reply: FinalizeReply = parse_reply(step, &response)?;
        if !reply.ok {
            return Err(api_error(step, reply.error));
        }
        Ok(())
    }

    /// Send and require a 2xx status.
    fn send(&self, step: UploadStep, request: &HttpRequest) -> Result<HttpResponse, DeliveryError> {
        let response = self
            .transport
            .send(request)
            .map_err(|source| DeliveryError::Transport { step, source })?;
        if !response.is_success() {
            return Err(DeliveryError::Status {
                step,
                status: response.status,
                body: response.body_text(),
            });
        }
        Ok(response)
    }
}

fn parse_reply<T: DeserializeOwned>(
    step: UploadStep,
    response: &HttpResponse,
) -> Result<T, DeliveryError> {
    serde_json::from_slice(&response.body).map_err(|e| DeliveryError::Malformed {
        step,
        reason: format!("{}: {}", e, response.body_text()),
    })
}

fn api_error(step: UploadStep, error: Option<String>) -> DeliveryError {
    DeliveryError::Api {
        step,
        error: error.unwrap_or_else(|| "unknown_error".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, RequestBody, ScriptedTransport};

    fn channel() -> ChannelConfig {
        ChannelConfig {
            api_base: "https://chat.example/api".to_string(),
            channel_id: "C42".to_string(),
            token: "xoxb-1".to_string(),
            initial_comment: "costs".to_string(),
            filename_prefix: "cloud_cost".to_string(),
            spool_dir: None,
        }
    }

    #[test]
    fn negotiate_builds_query_and_auth() {
        let t = ScriptedTransport::new().respond_json(
            200,
            r#"{"ok":true,"upload_url":"https://files.example/u","file_id":"F9"}"#,
        );
        let ch = channel();
        let ticket = ChatUploader::new(&t, &ch)
            .negotiate("cloud cost 2024-01.csv", 321)
            .unwrap();
        assert_eq!(ticket.file_id, "F9");

        let req = &t.requests()[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.url,
            "https://chat.example/api/files.getUploadURLExternal?filename=cloud+cost+2024-01.csv&length=321"
        );
        assert_eq!(req.header_value("Authorization"), Some("Bearer xoxb-1"));
    }

    #[test]
    fn negotiate_ok_false_is_api_error() {
        let t = ScriptedTransport::new().respond_json(200, r#"{"ok":false,"error":"not_authed"}"#);
        let ch = channel();
        let err = ChatUploader::new(&t, &ch).negotiate("f.csv", 1).unwrap_err();
        match err {
            DeliveryError::Api { step, error } => {
                assert_eq!(step, UploadStep::Negotiate);
                assert_eq!(error, "not_authed");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn negotiate_missing_fields_is_malformed() {
        let t = ScriptedTransport::new().respond_json(200, r#"{"ok":true}"#);
        let ch = channel();
        let err = ChatUploader::new(&t, &ch).negotiate("f.csv", 1).unwrap_err();
        assert!(matches!(err, DeliveryError::Malformed { .. }));
    }

    #[test]
    fn transfer_has_no_auth_and_multipart_body() {
        let t = ScriptedTransport::new().respond_json(200, "OK - 10");
        let ch = channel();
        let ticket = UploadTicket {
            upload_url: "https://files.example/u".to_string(),
            file_id: "F1".to_string(),
        };
        ChatUploader::new(&t, &ch)
            .transfer(&ticket, Path::new("/tmp/x.csv"), "x.csv")
            .unwrap();
        let req = &t.requests()[0];
        assert_eq!(req.url, "https://files.example/u");
        assert!(req.header_value("Authorization").is_none());
        match &req.body {
            RequestBody::MultipartFile {
                field,
                filename,
                content_type,
                ..
            } => {
                assert_eq!(field, "file");
                assert_eq!(filename, "x.csv");
                assert_eq!(content_type, "text/csv");
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn finalize_non_2xx_is_status_error() {
        let t = ScriptedTransport::new().respond_json(500, "oops");
        let ch = channel();
        let ticket = UploadTicket {
            upload_url: "u".to_string(),
            file_id: "F1".to_string(),
        };
        let err = ChatUploader::new(&t, &ch).finalize(&ticket, "t").unwrap_err();
        match err {
            DeliveryError::Status { step, status, .. } => {
                assert_eq!(step, UploadStep::Finalize);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
