//! Success-path results.
//!
//! An endpoint builds an [`ApiResult`] with one of the factories and then sets
//! content and headers as required:
//!
//! ```
//! use endware::ApiResult;
//!
//! // 201 with a body marshalled per the request Accept header
//! let created = ApiResult::created().with_value(vec!["a", "b"]);
//!
//! // 200 with an explicit body; negotiation is bypassed
//! let text = ApiResult::ok().with_content("text/plain", b"example".to_vec());
//! ```

use std::fmt::{self, Display};

use axum::http::StatusCode;

use crate::error::{EndwareError, InvalidStatusCode};
use crate::http::headers::Headers;
use crate::http::request::ApiRequest;
use crate::http::response::Response;
use crate::observability::logging::InternalError;
use crate::observability::metrics;
use crate::reply::content::Content;
use crate::reply::error::ApiError;

enum Payload {
    /// Bytes sent verbatim under an explicit content type.
    Raw { content_type: String, bytes: Vec<u8> },
    /// A value marshalled according to negotiation.
    Value(Box<dyn Content>),
}

/// A successful REST API result.
pub struct ApiResult {
    payload: Option<Payload>,
    headers: Headers,
    status: StatusCode,
}

impl ApiResult {
    fn with_status_code(status: StatusCode) -> Self {
        Self {
            payload: None,
            headers: Headers::new(),
            status,
        }
    }

    pub fn ok() -> Self {
        Self::with_status_code(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status_code(StatusCode::CREATED)
    }

    pub fn accepted() -> Self {
        Self::with_status_code(StatusCode::ACCEPTED)
    }

    pub fn no_content() -> Self {
        Self::with_status_code(StatusCode::NO_CONTENT)
    }

    /// `501 Not Implemented`, a common placeholder for unfinished endpoints;
    /// it needs none of the capabilities of an [`ApiError`].
    pub fn not_implemented() -> Self {
        Self::with_status_code(StatusCode::NOT_IMPLEMENTED)
    }

    /// A result with an arbitrary status code in `100..=599`.
    ///
    /// Codes below `100` are rejected as well as those above `599`:
    /// `http::StatusCode` cannot represent them, so the nominal `1..=599`
    /// range starts at `100` here.
    pub fn status(code: u16) -> Result<Self, InvalidStatusCode> {
        let code = InvalidStatusCode::check(code, 100, 599, "1xx-5xx")?;
        StatusCode::from_u16(code)
            .map(Self::with_status_code)
            .map_err(|_| InvalidStatusCode {
                code,
                range: "1xx-5xx",
            })
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set an explicit content type and body, replacing any previous content.
    pub fn with_content(mut self, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(Payload::Raw {
            content_type: content_type.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// Set a value to be marshalled per the request `Accept` header,
    /// replacing any previous content and content type.
    pub fn with_value<T: Content + 'static>(mut self, value: T) -> Self {
        self.payload = Some(Payload::Value(Box::new(value)));
        self
    }

    pub(crate) fn with_boxed_value(mut self, value: Box<dyn Content>) -> Self {
        self.payload = Some(Payload::Value(value));
        self
    }

    pub fn with_header(mut self, key: &str, value: impl Display) -> Self {
        self.headers.set(key, value);
        self
    }

    pub fn with_headers<K, V, I>(mut self, headers: I) -> Self
    where
        K: AsRef<str>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        self.headers.set_all(headers);
        self
    }

    /// Set a header without canonicalising the key. Rarely needed.
    pub fn with_non_canonical_header(mut self, key: &str, value: impl Display) -> Self {
        self.headers.set_non_canonical(key, value);
        self
    }

    /// Build the response.
    ///
    /// A value that fails to marshal yields a `500` error response wrapping
    /// the marshalling failure, never the original value.
    pub fn into_response(self, rq: &ApiRequest<'_>) -> Response {
        let description = self.to_string();
        let Self {
            payload,
            headers,
            status,
        } = self;

        match payload {
            None => Response::empty(status).with_headers(headers),

            Some(Payload::Raw {
                content_type,
                bytes,
            }) => Response::new(status, content_type, bytes).with_headers(headers),

            Some(Payload::Value(value)) => {
                let negotiation = rq.negotiation();
                match value.marshal(negotiation.format) {
                    Ok(body) => {
                        Response::new(status, negotiation.content_type, body).with_headers(headers)
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Result marshalling failed");
                        metrics::record_internal_error("marshal_result");
                        rq.report(InternalError {
                            message: "error marshalling Result response".into(),
                            error: Some(e.to_string()),
                            help: Some(format!("Result: {}", description)),
                            request: Some(rq.info().clone()),
                            content_type: Some(negotiation.content_type.into()),
                        });
                        ApiError::internal_server_error()
                            .with_cause(EndwareError::MarshalResult(e))
                            .into_response(rq)
                    }
                }
            }
        }
    }
}

impl Display for ApiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content_type = match &self.payload {
            None => "<none>",
            Some(Payload::Raw { content_type, .. }) => content_type.as_str(),
            Some(Payload::Value(_)) => "<negotiated>",
        };
        write!(
            f,
            "{{status: {}, content_type: {}, headers: {}}}",
            self.status.as_u16(),
            content_type,
            self.headers.len()
        )
    }
}
