//! Error projection.
//!
//! # Responsibilities
//! - Define the `ErrorInfo` snapshot handed to the projection function
//! - Provide the default projection model for JSON and XML error bodies
//!
//! # Design Decisions
//! - The projection is wholesale replaceable; applications return any
//!   marshallable value from their own function
//! - Additional properties are kept sorted so that JSON and XML encodings of
//!   equivalent errors are byte-stable

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::http::request::RequestInfo;
use crate::reply::content::Content;

/// A resolved, read-only view of an [`ApiError`](super::ApiError) at the
/// moment its response is built.
#[derive(Debug, Clone, Copy)]
pub struct ErrorInfo<'a> {
    pub status: StatusCode,
    pub cause: Option<&'a (dyn std::error::Error + Send + Sync + 'static)>,
    pub help: Option<&'a str>,
    pub message: Option<&'a str>,
    pub request: &'a RequestInfo,
    pub properties: &'a BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Converts an error snapshot into a marshallable response body.
pub type Projection = Arc<dyn Fn(&ErrorInfo<'_>) -> Box<dyn Content> + Send + Sync>;

/// The default error body.
///
/// JSON: `{"status":…,"error":…,"message"?:…,"path":…,"query"?:…,
/// "timestamp":…,"help"?:…,"additional"?:{…}}`; XML mirrors this under a
/// root `<error>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "error")]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, Value>,
}

impl From<&ErrorInfo<'_>> for ErrorResponse {
    fn from(info: &ErrorInfo<'_>) -> Self {
        let message = match (info.cause, info.message) {
            (Some(cause), Some(message)) => Some(format!("{}: {}", cause, message)),
            (Some(cause), None) => Some(cause.to_string()),
            (None, message) => message.map(str::to_string),
        };

        Self {
            status: info.status.as_u16(),
            error: info.status.canonical_reason().unwrap_or_default().to_string(),
            message,
            path: info.request.path.clone(),
            query: info.request.query.clone(),
            timestamp: info.timestamp,
            help: info.help.map(str::to_string),
            additional: info.properties.clone(),
        }
    }
}

/// The default projection function.
pub fn project_error(info: &ErrorInfo<'_>) -> Box<dyn Content> {
    Box::new(ErrorResponse::from(info))
}

pub fn default_projection() -> Projection {
    Arc::new(project_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::negotiate::Format;
    use chrono::TimeZone;
    use std::fmt;

    #[derive(Debug)]
    struct Oops;

    impl fmt::Display for Oops {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("oops")
        }
    }

    impl std::error::Error for Oops {}

    fn info<'a>(
        request: &'a RequestInfo,
        properties: &'a BTreeMap<String, Value>,
        cause: Option<&'a Oops>,
        message: Option<&'a str>,
    ) -> ErrorInfo<'a> {
        ErrorInfo {
            status: StatusCode::BAD_REQUEST,
            cause: cause.map(|c| c as &(dyn std::error::Error + Send + Sync + 'static)),
            help: None,
            message,
            request,
            properties,
            timestamp: Utc.with_ymd_and_hms(2012, 11, 10, 9, 8, 7).unwrap(),
        }
    }

    fn request() -> RequestInfo {
        RequestInfo {
            path: "/api/v1/test".into(),
            query: Some("param=value".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_message_forms() {
        let rq = request();
        let props = BTreeMap::new();

        let p = ErrorResponse::from(&info(&rq, &props, None, Some("message")));
        assert_eq!(p.message.as_deref(), Some("message"));
        assert_eq!(p.error, "Bad Request");
        assert_eq!(p.path, "/api/v1/test");
        assert_eq!(p.query.as_deref(), Some("param=value"));

        let p = ErrorResponse::from(&info(&rq, &props, Some(&Oops), None));
        assert_eq!(p.message.as_deref(), Some("oops"));

        let p = ErrorResponse::from(&info(&rq, &props, Some(&Oops), Some("message")));
        assert_eq!(p.message.as_deref(), Some("oops: message"));

        let p = ErrorResponse::from(&info(&rq, &props, None, None));
        assert_eq!(p.message, None);
    }

    #[test]
    fn test_json_body() {
        let rq = request();
        let mut props = BTreeMap::new();
        props.insert("zeta".to_string(), Value::from(1));
        props.insert("alpha".to_string(), Value::from("a"));

        let body = project_error(&info(&rq, &props, None, Some("message")))
            .marshal(Format::Json)
            .unwrap();

        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#"{"status":400,"error":"Bad Request","message":"message","path":"/api/v1/test","query":"param=value","timestamp":"2012-11-10T09:08:07Z","additional":{"alpha":"a","zeta":1}}"#
        );
    }

    #[test]
    fn test_xml_body() {
        let rq = request();
        let mut props = BTreeMap::new();
        props.insert("zeta".to_string(), Value::from("z"));
        props.insert("alpha".to_string(), Value::from("a"));

        let body = project_error(&info(&rq, &props, None, None))
            .marshal(Format::Xml)
            .unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.starts_with("<error><status>400</status><error>Bad Request</error>"), "{}", body);
        assert!(body.contains("<path>/api/v1/test</path>"), "{}", body);
        assert!(!body.contains("<message>"), "{}", body);
        assert!(
            body.contains("<additional><alpha>a</alpha><zeta>z</zeta></additional>"),
            "{}",
            body
        );
    }
}
