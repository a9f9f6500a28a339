//! Errors raised by the response pipeline itself.

use thiserror::Error;

use crate::http::negotiate::MarshalError;

/// A status code outside the range permitted for its use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status code: {code}: valid range is {range}")]
pub struct InvalidStatusCode {
    pub code: u16,
    pub range: &'static str,
}

impl InvalidStatusCode {
    /// Accept `code` if it lies in `min..=max`.
    pub(crate) fn check(code: u16, min: u16, max: u16, range: &'static str) -> Result<u16, Self> {
        if (min..=max).contains(&code) {
            Ok(code)
        } else {
            Err(Self { code, range })
        }
    }
}

/// Failures while turning a reply into a response.
#[derive(Debug, Error)]
pub enum EndwareError {
    #[error("error marshalling response: {0}")]
    MarshalResult(#[source] MarshalError),

    #[error("error marshalling Problem response: {0}")]
    MarshalProblem(#[source] MarshalError),

    #[error("invalid operation: an uninitialised Problem was returned")]
    EmptyProblem,

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusCode),

    /// An endpoint fault caught at the handler boundary.
    #[error("panic: {0}")]
    Fault(String),

    #[error("error reading request body: {0}")]
    ReadBody(String),
}
