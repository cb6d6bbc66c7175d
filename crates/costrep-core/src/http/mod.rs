//! Blocking HTTP plumbing shared by every outbound call.
//!
//! All calls go through [`HttpTransport`] so the retry loop and the upload
//! protocol can be exercised against a scripted transport in tests. The
//! production implementation is [`CurlTransport`] (libcurl, current thread).

mod curl_transport;
mod headers;

pub use curl_transport::CurlTransport;
pub use headers::parse_header_lines;

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Raw bytes with a content type (JSON bodies).
    Bytes { content_type: String, data: Vec<u8> },
    /// Single-file multipart form, streamed from disk.
    MultipartFile {
        field: String,
        path: PathBuf,
        filename: String,
        content_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Bytes {
                content_type: "application/json; charset=utf-8".to_string(),
                data,
            },
        }
    }

    pub fn post_file(
        url: impl Into<String>,
        field: &str,
        path: PathBuf,
        filename: &str,
        content_type: &str,
    ) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::MultipartFile {
                field: field.to_string(),
                path,
                filename: filename.to_string(),
                content_type: content_type.to_string(),
            },
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Value of the first request header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value of the last header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text for diagnostics (lossy UTF-8).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure before an HTTP status was available.
#[derive(Debug)]
pub enum TransportError {
    Curl(curl::Error),
    Form(curl::FormError),
    /// Raised by non-curl transports (tests, future backends).
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Form(e) => write!(f, "multipart form: {}", e),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Form(e) => Some(e),
            TransportError::Other(_) => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

impl From<curl::FormError> for TransportError {
    fn from(e: curl::FormError) -> Self {
        TransportError::Form(e)
    }
}

/// Sends one request and returns the final response. Never retries.
pub trait HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport that replays canned responses in order and records requests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<HttpResponse, String>>>,
    requests: std::sync::Mutex<Vec<HttpRequest>>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, response: HttpResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub(crate) fn respond_json(self, status: u32, body: &str) -> Self {
        self.respond(HttpResponse::new(status, body.as_bytes().to_vec()))
    }

    pub(crate) fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl HttpTransport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(r)) => Ok(r),
            Some(Err(msg)) => Err(TransportError::Other(msg)),
            None => Err(TransportError::Other(format!(
                "no scripted response for {} {}",
                request.method, request.url
            ))),
        }
    }
}
