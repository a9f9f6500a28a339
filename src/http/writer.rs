//! Transport write seam.
//!
//! # Design Decisions
//! - Mirrors a streaming transport: headers are mutable only until the status
//!   is committed, after which they are frozen
//! - Body writes may fail; the status already committed cannot be revised

use std::io;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};

/// The minimal transport surface a [`Response`](super::Response) writes to.
pub trait ResponseWriter {
    /// Set a header. Ignored once the status has been committed.
    fn set_header(&mut self, name: &str, value: &str);

    /// Commit the status code, finalising the headers.
    fn commit(&mut self, status: StatusCode);

    /// Write body bytes.
    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;
}

/// Buffers a complete response for frameworks that return a value rather
/// than writing to a socket.
#[derive(Debug, Default)]
pub struct BufferedWriter {
    headers: Vec<(HeaderName, HeaderValue)>,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl BufferedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Convert the buffered output to an axum response.
    ///
    /// A writer that was never committed yields `500 Internal Server Error`.
    pub fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        response
    }
}

impl ResponseWriter for BufferedWriter {
    fn set_header(&mut self, name: &str, value: &str) {
        if self.status.is_some() {
            return;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.retain(|(existing, _)| *existing != name);
                self.headers.push((name, value));
            }
            _ => tracing::warn!(header = %name, "Dropping header that is not valid on the wire"),
        }
    }

    fn commit(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(body);
        Ok(())
    }
}
