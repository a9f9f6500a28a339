//! Endpoint replies and the dispatcher.
//!
//! # Data Flow
//! ```text
//! endpoint function
//!     → Reply (closed set of variants)
//!     → ApiRequest::respond (exhaustive match)
//!     → ApiResult / ApiError / Problem build logic
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Every variant funnels through the result or error build logic; no
//!   branch writes a response on its own
//! - An empty byte payload (204) is distinct from no payload at all

pub mod content;
pub mod error;
pub mod problem;
pub mod projection;
pub mod result;

use serde::Serialize;

use crate::error::EndwareError;
use crate::http::request::ApiRequest;
use crate::http::response::{Response, OCTET_STREAM};

pub use content::Content;
pub use error::{ApiError, BoxError, JoinedError};
pub use problem::{Problem, ReservedProperty};
pub use projection::{ErrorInfo, ErrorResponse, Projection};
pub use result::ApiResult;

/// The value returned by an endpoint function.
pub enum Reply {
    Error(ApiError),
    Problem(Problem),
    Result(ApiResult),
    /// Any other error; sent as a `500` wrapping it.
    Failure(BoxError),
    /// Raw bytes: `200` with `application/octet-stream`, or `204` if empty.
    Bytes(Vec<u8>),
    /// A bare status code with no body.
    Status(u16),
    /// A value sent as `200` and marshalled per negotiation.
    Value(Box<dyn Content>),
}

impl Reply {
    /// A `200` reply carrying a value for negotiated marshalling.
    pub fn value<T: Serialize + Send + 'static>(value: T) -> Self {
        Reply::Value(Box::new(value))
    }

    pub fn failure(error: impl Into<BoxError>) -> Self {
        Reply::Failure(error.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Reply::Error(_) => "error",
            Reply::Problem(_) => "problem",
            Reply::Result(_) => "result",
            Reply::Failure(_) => "failure",
            Reply::Bytes(_) => "bytes",
            Reply::Status(_) => "status",
            Reply::Value(_) => "value",
        }
    }
}

impl From<ApiError> for Reply {
    fn from(e: ApiError) -> Self {
        Reply::Error(e)
    }
}

impl From<Problem> for Reply {
    fn from(p: Problem) -> Self {
        Reply::Problem(p)
    }
}

impl From<ApiResult> for Reply {
    fn from(r: ApiResult) -> Self {
        Reply::Result(r)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Reply::Bytes(bytes)
    }
}

impl From<u16> for Reply {
    fn from(code: u16) -> Self {
        Reply::Status(code)
    }
}

impl ApiRequest<'_> {
    /// Turn an endpoint reply into a response.
    pub fn respond(&self, reply: Reply) -> Result<Response, EndwareError> {
        tracing::debug!(kind = reply.kind(), path = %self.info().path, "Dispatching reply");

        match reply {
            Reply::Error(e) => Ok(e.into_response(self)),
            Reply::Problem(p) => p.into_response(self),
            Reply::Result(r) => Ok(r.into_response(self)),
            Reply::Failure(e) => Ok(ApiError::internal_server_error()
                .with_cause(e)
                .into_response(self)),
            Reply::Bytes(bytes) if bytes.is_empty() => Ok(ApiResult::no_content().into_response(self)),
            Reply::Bytes(bytes) => Ok(ApiResult::ok()
                .with_content(OCTET_STREAM, bytes)
                .into_response(self)),
            Reply::Status(code) => Ok(ApiResult::status(code)?.into_response(self)),
            Reply::Value(value) => Ok(ApiResult::ok().with_boxed_value(value).into_response(self)),
        }
    }
}
