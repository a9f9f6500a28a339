//! Failure-path errors.
//!
//! An endpoint obtains an [`ApiError`] from a factory and adds whatever
//! information the client needs:
//!
//! ```
//! use endware::ApiError;
//!
//! let e = ApiError::bad_request()
//!     .with_message("ID is missing or invalid")
//!     .with_help("The ID must be a UUID provided in the request path: /v1/resource/<ID>");
//! assert_eq!(e.to_string(), "400 Bad Request: ID is missing or invalid");
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::InvalidStatusCode;
use crate::http::headers::Headers;
use crate::http::request::{ApiRequest, RequestInfo};
use crate::http::response::{Response, FALLBACK_CONTENT_TYPE};
use crate::observability::logging::InternalError;
use crate::observability::metrics;
use crate::reply::projection::ErrorInfo;

/// A boxed, thread-safe error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Several causes combined into one, each preserved for inspection.
#[derive(Debug)]
pub struct JoinedError {
    errors: Vec<BoxError>,
}

impl JoinedError {
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }
}

impl Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedError {}

/// A REST API error.
///
/// The status code is optional until the response is built, when an unset
/// status resolves to `500`. The same applies to the timestamp (taken from
/// the configured clock) and the request (taken from the inbound request).
#[derive(Debug, Default)]
pub struct ApiError {
    cause: Option<BoxError>,
    help: Option<String>,
    message: Option<String>,
    request: Option<RequestInfo>,
    status: Option<StatusCode>,
    timestamp: Option<DateTime<Utc>>,
    properties: BTreeMap<String, Value>,
    headers: Headers,
}

impl ApiError {
    /// An error with no status; it resolves to `500` when built.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_status_code(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn bad_request() -> Self {
        Self::with_status_code(StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized() -> Self {
        Self::with_status_code(StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::with_status_code(StatusCode::FORBIDDEN)
    }

    pub fn not_found() -> Self {
        Self::with_status_code(StatusCode::NOT_FOUND)
    }

    pub fn internal_server_error() -> Self {
        Self::with_status_code(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set the status code, which must be in `400..=599`.
    ///
    /// The first status applied wins: on an error that already has a status
    /// (such as one from [`ApiError::not_found`]) the code is validated but
    /// otherwise ignored.
    pub fn with_status(mut self, code: u16) -> Result<Self, InvalidStatusCode> {
        let code = InvalidStatusCode::check(code, 400, 599, "4xx-5xx")?;
        if self.status.is_none() {
            self.status = Some(StatusCode::from_u16(code).map_err(|_| InvalidStatusCode {
                code,
                range: "4xx-5xx",
            })?);
        }
        Ok(self)
    }

    /// Add to the message; successive messages are joined with a space.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = Some(match self.message.take() {
            Some(existing) => format!("{} {}", existing, message),
            None => message,
        });
        self
    }

    /// Add a cause. A single cause is kept as is; further causes are combined
    /// into a [`JoinedError`].
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        let combined: BoxError = match self.cause.take() {
            None => cause,
            Some(existing) => match existing.downcast::<JoinedError>() {
                Ok(mut joined) => {
                    joined.errors.push(cause);
                    joined
                }
                Err(single) => Box::new(JoinedError {
                    errors: vec![single, cause],
                }),
            },
        };
        self.cause = Some(combined);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the request the error relates to. Defaults to the inbound
    /// request when not set.
    pub fn with_request<B>(mut self, request: &axum::http::Request<B>) -> Self {
        self.request = Some(RequestInfo::from_request(request));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
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

    pub fn with_non_canonical_header(mut self, key: &str, value: impl Display) -> Self {
        self.headers.set_non_canonical(key, value);
        self
    }

    /// The explicitly set status code, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.as_u16())
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Every cause, with a joined cause flattened into its parts.
    pub fn causes(&self) -> Vec<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self.cause.as_deref() {
            None => Vec::new(),
            Some(cause) => match cause.downcast_ref::<JoinedError>() {
                Some(joined) => joined.errors.iter().map(|e| e.as_ref()).collect(),
                None => vec![cause],
            },
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    fn resolved_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Build the response by projecting the error and marshalling the
    /// projection in the negotiated format.
    ///
    /// If the projection cannot be marshalled a fixed plain-text body naming
    /// both failures is sent with status `500`, whatever the error's own
    /// status. No second marshalling attempt is made.
    pub fn into_response(self, rq: &ApiRequest<'_>) -> Response {
        let status = self.resolved_status();
        let timestamp = self.timestamp.unwrap_or_else(|| rq.now());
        let request = self.request.clone().unwrap_or_else(|| rq.info().clone());

        let projection = rq.project(&ErrorInfo {
            status,
            cause: self.cause.as_deref(),
            help: self.help.as_deref(),
            message: self.message.as_deref(),
            request: &request,
            properties: &self.properties,
            timestamp,
        });

        let negotiation = rq.negotiation();
        match projection.marshal(negotiation.format) {
            Ok(body) => Response::new(status, negotiation.content_type, body).with_headers(self.headers),
            Err(e) => {
                tracing::debug!(error = %e, "Error marshalling failed; sending fallback body");
                metrics::record_internal_error("marshal_error");
                rq.report(InternalError {
                    message: "error marshalling error response".into(),
                    error: Some(e.to_string()),
                    help: Some(format!("the original error was: {}", self)),
                    request: Some(request),
                    content_type: Some(negotiation.content_type.into()),
                });
                fallback_response(&e, &self)
            }
        }
    }
}

/// The fixed `500` sent when an error response itself cannot be built.
/// Carries no projection and no headers.
pub(crate) fn fallback_response(failure: &dyn Display, original: &dyn Display) -> Response {
    let body = format!(
        "An error occurred marshalling an error response\n\n\
         The marshalling error was:\n   {}\n\n\
         The original error was:\n   {}",
        failure, original
    );
    Response::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        FALLBACK_CONTENT_TYPE,
        body.into_bytes(),
    )
}

/// `<code> <status text>[: <cause>][: <message>]`
impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.resolved_status();
        write!(
            f,
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )?;
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
