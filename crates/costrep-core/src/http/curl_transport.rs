//! libcurl-backed transport.

use curl::easy::{Easy, Form, List};
use std::str;
use std::time::Duration;

use super::headers::parse_header_lines;
use super::{HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, TransportError};

/// Performs each request on a fresh `Easy` handle in the current thread.
/// Call from `spawn_blocking` if used from async code.
#[derive(Debug, Clone, Copy)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_secs(60))
    }
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }
}

impl HttpTransport for CurlTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = Easy::new();
        easy.url(&request.url)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        // Suppress `Expect: 100-continue` on larger bodies.
        list.append("Expect:")?;

        match (&request.method, &request.body) {
            (Method::Get, _) => {
                easy.get(true)?;
            }
            (Method::Post, RequestBody::Empty) => {
                easy.post(true)?;
                easy.post_fields_copy(&[])?;
            }
            (Method::Post, RequestBody::Bytes { content_type, data }) => {
                list.append(&format!("Content-Type: {}", content_type))?;
                easy.post(true)?;
                easy.post_fields_copy(data)?;
            }
            (
                Method::Post,
                RequestBody::MultipartFile {
                    field,
                    path,
                    filename,
                    content_type,
                },
            ) => {
                let mut form = Form::new();
                form.part(field)
                    .file(path)
                    .filename(filename)
                    .content_type(content_type)
                    .add()?;
                easy.httppost(form)?;
            }
        }
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            bytes = body.len(),
            "http request completed"
        );

        Ok(HttpResponse {
            status,
            headers: parse_header_lines(&header_lines),
            body,
        })
    }
}
