//! Request context and body decoding.
//!
//! # Responsibilities
//! - Capture the parts of an inbound request that error projection needs
//! - Negotiate the response content type once per request
//! - Decode JSON request bodies for endpoint functions
//!
//! # Design Decisions
//! - The buffered body is borrowed, never consumed, so it stays readable
//!   after decoding
//! - An empty body is not an error in lenient mode; the endpoint decides

use axum::body::Bytes;
use axum::http::{header, Method, Request};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::endware::Endware;
use crate::http::negotiate::{self, Negotiation, NegotiationError};
use crate::observability::logging::InternalError;
use crate::reply::error::ApiError;
use crate::reply::projection::ErrorInfo;
use crate::reply::{Content, Reply};

/// The request details retained for error projection and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    /// Raw query string; `None` when absent or empty.
    pub query: Option<String>,
}

impl RequestInfo {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            query: request
                .uri()
                .query()
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        }
    }
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".into(),
            query: None,
        }
    }
}

/// Read the `Accept` header of a request and negotiate it.
pub fn negotiate_request<B>(request: &Request<B>) -> Result<Negotiation, NegotiationError> {
    match request.headers().get(header::ACCEPT) {
        None => negotiate::negotiate(""),
        Some(value) => value
            .to_str()
            .map_err(|_| NegotiationError::InvalidAccept(format!("{:?}", value)))
            .and_then(negotiate::negotiate),
    }
}

/// A negotiated inbound request, bound to the configuration that serves it.
pub struct ApiRequest<'a> {
    info: RequestInfo,
    negotiation: Negotiation,
    endware: &'a Endware,
}

impl<'a> ApiRequest<'a> {
    /// Negotiate the request's `Accept` header.
    pub fn new<B>(request: &Request<B>, endware: &'a Endware) -> Result<Self, NegotiationError> {
        Ok(Self {
            info: RequestInfo::from_request(request),
            negotiation: negotiate_request(request)?,
            endware,
        })
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub fn negotiation(&self) -> Negotiation {
        self.negotiation
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.endware.clock)()
    }

    pub(crate) fn project(&self, info: &ErrorInfo<'_>) -> Box<dyn Content> {
        (self.endware.projection)(info)
    }

    pub(crate) fn report(&self, error: InternalError) {
        (self.endware.diagnostics)(&error)
    }
}

/// Request body decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("a body is required")]
    BodyRequired,

    #[error("unexpected field: {0}")]
    UnexpectedField(String),

    #[error("decode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a JSON request body and pass it to `f`.
///
/// An empty body calls `f(None)`. Unknown fields are ignored unless `T`
/// denies them, in which case the failure is treated like any decode error.
pub fn decode_body<T, F>(request: &Request<Bytes>, f: F) -> Reply
where
    T: DeserializeOwned,
    F: FnOnce(Option<T>) -> Reply,
{
    decode(request, false, f)
}

/// Like [`decode_body`], but an empty body or an unknown field (for `T`
/// using `#[serde(deny_unknown_fields)]`) is a `400 Bad Request`.
pub fn decode_body_strict<T, F>(request: &Request<Bytes>, f: F) -> Reply
where
    T: DeserializeOwned,
    F: FnOnce(Option<T>) -> Reply,
{
    decode(request, true, f)
}

fn decode<T, F>(request: &Request<Bytes>, strict: bool, f: F) -> Reply
where
    T: DeserializeOwned,
    F: FnOnce(Option<T>) -> Reply,
{
    let body = request.body();
    if body.is_empty() {
        if strict {
            return ApiError::bad_request()
                .with_cause(DecodeError::BodyRequired)
                .into();
        }
        return f(None);
    }

    match serde_json::from_slice::<T>(body) {
        Ok(value) => f(Some(value)),
        // serde_json has no structured kind for this case
        Err(e) if strict && e.to_string().starts_with("unknown field") => ApiError::bad_request()
            .with_cause(DecodeError::UnexpectedField(e.to_string()))
            .into(),
        Err(e) => Reply::failure(DecodeError::Json(e)),
    }
}
