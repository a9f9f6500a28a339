//! Wire-level response.
//!
//! # Responsibilities
//! - Hold the final status, content type, body and headers of a reply
//! - Write them to a transport in a fixed order
//!
//! # Design Decisions
//! - Content-Type, then additional headers, then status, then body: committing
//!   the status finalises headers on most transports
//! - A body write failure is reported to the diagnostic hook and otherwise
//!   swallowed; the committed status stands

use std::fmt;

use axum::http::StatusCode;

use crate::http::headers::Headers;
use crate::http::request::RequestInfo;
use crate::http::writer::ResponseWriter;
use crate::observability::logging::InternalError;
use crate::observability::metrics;

/// Content type of raw byte replies.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type of the terminal fallback body.
pub const FALLBACK_CONTENT_TYPE: &str = "plain/text";

/// A response ready to be written. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
    headers: Headers,
}

impl Response {
    pub fn new(status: StatusCode, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
            headers: Headers::new(),
        }
    }

    /// A response carrying only a status code.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, String::new(), Vec::new())
    }

    pub(crate) fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type; empty when the response has no body.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Write the response to a transport.
    pub fn write<W, D>(&self, writer: &mut W, request: &RequestInfo, diagnostics: D)
    where
        W: ResponseWriter + ?Sized,
        D: Fn(&InternalError),
    {
        if !self.content_type.is_empty() {
            writer.set_header("Content-Type", &self.content_type);
        }
        for (key, value) in self.headers.iter() {
            writer.set_header(key, value);
        }
        writer.commit(self.status);
        metrics::record_response(self.status.as_u16(), metrics::kind_of(self.status));

        if let Err(e) = writer.write_body(&self.body) {
            metrics::record_internal_error("write");
            diagnostics(&InternalError {
                message: "error writing response".into(),
                error: Some(e.to_string()),
                help: Some(format!("(response: {}): write error: {}", self, e)),
                request: Some(request.clone()),
                content_type: Some(self.content_type.clone()),
            });
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or_default()
        )
    }
}
