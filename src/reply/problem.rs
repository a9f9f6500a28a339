//! RFC 7807 Problem Details.
//!
//! <https://www.rfc-editor.org/rfc/rfc7807>
//!
//! # Design Decisions
//! - Only fields that were set are emitted, each under its RFC key
//! - The response content type is always `application/problem+json`,
//!   whatever the request `Accept` header says
//! - Reserved keys cannot be set as free-form properties

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::error::{EndwareError, InvalidStatusCode};
use crate::http::negotiate::Format;
use crate::http::request::ApiRequest;
use crate::http::response::Response;
use crate::observability::logging::InternalError;
use crate::observability::metrics;
use crate::reply::error::ApiError;

/// Media type of every Problem response.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

const RESERVED: [&str; 5] = ["type", "title", "status", "detail", "instance"];

/// A property key that would shadow a Problem field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: '{0}' is a reserved field which must be set using the appropriate Problem method")]
pub struct ReservedProperty(pub String);

/// An RFC 7807 problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    problem_type: Option<Url>,
    title: Option<String>,
    status: Option<StatusCode>,
    detail: Option<String>,
    instance: Option<Url>,
    properties: BTreeMap<String, Value>,
}

impl Problem {
    /// An empty problem, to be filled in with the `with_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// A problem for a status code, with the status text as detail.
    pub fn from_status(code: u16) -> Result<Self, InvalidStatusCode> {
        let problem = Self::new().with_status(code)?;
        let detail = problem
            .status
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Ok(problem.with_detail(detail))
    }

    /// Set the status, replacing any previous one.
    pub fn with_status(mut self, code: u16) -> Result<Self, InvalidStatusCode> {
        let code = InvalidStatusCode::check(code, 100, 599, "1xx-5xx")?;
        self.status = Some(StatusCode::from_u16(code).map_err(|_| InvalidStatusCode {
            code,
            range: "1xx-5xx",
        })?);
        Ok(self)
    }

    /// Set the type URI with a title; title parts are joined with spaces.
    pub fn with_type<S: AsRef<str>>(mut self, problem_type: Url, title: &[S]) -> Self {
        self.problem_type = Some(problem_type);
        let title = title.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        self.title = (!title.is_empty()).then_some(title);
        self
    }

    /// Set the human-readable explanation of this occurrence.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the URI identifying this occurrence.
    pub fn with_instance(mut self, instance: Url) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Describe the problem from an error: status `500` and the error text as
    /// detail, each applied only if not already set.
    pub fn with_error(mut self, error: &dyn std::error::Error) -> Self {
        if self.status.is_none() {
            self.status = Some(StatusCode::INTERNAL_SERVER_ERROR);
        }
        if self.detail.is_none() {
            self.detail = Some(error.to_string());
        }
        self
    }

    /// Merge properties; later values replace earlier ones on key conflict.
    pub fn with_properties<K, V, I>(mut self, properties: I) -> Result<Self, ReservedProperty>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in properties {
            self = self.with_property(key, value)?;
        }
        Ok(self)
    }

    /// Set one property. Reserved field names are rejected.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self, ReservedProperty> {
        let key = key.into();
        if RESERVED.contains(&key.as_str()) {
            return Err(ReservedProperty(key));
        }
        self.properties.insert(key, value.into());
        Ok(self)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.as_u16())
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The sparse JSON object for this problem.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(t) = &self.problem_type {
            map.insert("type".into(), Value::from(t.as_str()));
        }
        if let Some(title) = &self.title {
            map.insert("title".into(), Value::from(title.as_str()));
        }
        if let Some(status) = self.status {
            map.insert("status".into(), Value::from(status.as_u16()));
        }
        if let Some(detail) = &self.detail {
            map.insert("detail".into(), Value::from(detail.as_str()));
        }
        if let Some(instance) = &self.instance {
            map.insert("instance".into(), Value::from(instance.as_str()));
        }
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Build the response.
    ///
    /// A problem with nothing set is a defect in the endpoint and yields
    /// [`EndwareError::EmptyProblem`].
    pub fn into_response(self, rq: &ApiRequest<'_>) -> Result<Response, EndwareError> {
        let map = self.to_map();
        if map.is_empty() {
            return Err(EndwareError::EmptyProblem);
        }

        match Format::Json.marshal(&map) {
            Ok(body) => Ok(Response::new(
                self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                PROBLEM_CONTENT_TYPE,
                body,
            )),
            Err(e) => {
                metrics::record_internal_error("marshal_problem");
                rq.report(InternalError {
                    message: "error marshalling Problem response".into(),
                    error: Some(e.to_string()),
                    help: Some(format!("Problem: {:?}", self)),
                    request: Some(rq.info().clone()),
                    content_type: Some(PROBLEM_CONTENT_TYPE.into()),
                });
                Ok(ApiError::internal_server_error()
                    .with_cause(EndwareError::MarshalProblem(e))
                    .into_response(rq))
            }
        }
    }
}
