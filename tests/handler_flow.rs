//! End-to-end tests of the request pipeline through `Endware::serve`.

use std::cell::Cell;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;

use endware::reply::ErrorInfo;
use endware::{ApiError, ApiResult, Content, EndwareConfig, Problem, Reply};

mod common;
use common::{recording_endware, request, Call, RecordingWriter, Unmarshallable};

#[derive(Serialize)]
#[serde(rename = "resource")]
struct Resource {
    id: u32,
    name: &'static str,
}

#[test]
fn test_created_result_is_negotiated_json() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| ApiResult::created().with_value(Resource { id: 1, name: "x" }).into(),
        &mut writer,
    );

    assert_eq!(
        writer.calls,
        vec![
            Call::Header("Content-Type".into(), "application/json".into()),
            Call::Commit(StatusCode::CREATED),
            Call::Body(br#"{"id":1,"name":"x"}"#.to_vec()),
        ]
    );
    assert!(reported.lock().unwrap().is_empty());
}

#[test]
fn test_xml_negotiation() {
    let (endware, _) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", Some("application/xml"), ""),
        |_| Reply::value(Resource { id: 1, name: "x" }),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::OK));
    assert_eq!(writer.header("Content-Type"), Some("application/xml"));
    assert_eq!(writer.body(), "<resource><id>1</id><name>x</name></resource>");
}

#[test]
fn test_headers_precede_status() {
    let (endware, _) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| {
            ApiResult::ok()
                .with_content("text/plain", b"hello".to_vec())
                .with_header("x-request-id", "abc")
                .into()
        },
        &mut writer,
    );

    assert_eq!(
        writer.calls,
        vec![
            Call::Header("Content-Type".into(), "text/plain".into()),
            Call::Header("X-Request-Id".into(), "abc".into()),
            Call::Commit(StatusCode::OK),
            Call::Body(b"hello".to_vec()),
        ]
    );
}

#[test]
fn test_bad_request_error() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources?id=", None, ""),
        |_| ApiError::bad_request().with_message("missing id").into(),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(writer.header("Content-Type"), Some("application/json"));
    assert_eq!(
        writer.body(),
        r#"{"status":400,"error":"Bad Request","message":"missing id","path":"/v1/resources","query":"id=","timestamp":"2012-11-10T09:08:07Z"}"#
    );
    assert!(reported.lock().unwrap().is_empty());
}

#[test]
fn test_error_headers_are_written() {
    let (endware, _) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| {
            ApiError::new()
                .with_status(503)
                .unwrap()
                .with_header("retry-after", 30)
                .into()
        },
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(writer.header("Retry-After"), Some("30"));
}

#[test]
fn test_panic_is_contained() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| panic!("boom"),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(writer.body().contains(r#""message":"panic: boom""#), "{}", writer.body());

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "handler panic");
    assert_eq!(reported[0].error.as_deref(), Some("panic: boom"));
}

#[test]
fn test_not_acceptable_skips_endpoint() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();
    let called = Cell::new(false);

    endware.serve(
        &request("/v1/resources", Some("text/plain"), ""),
        |_| {
            called.set(true);
            Reply::Status(200)
        },
        &mut writer,
    );

    assert!(!called.get());
    assert_eq!(
        writer.calls,
        vec![
            Call::Header("Content-Type".into(), "application/json".into()),
            Call::Commit(StatusCode::NOT_ACCEPTABLE),
            Call::Body(
                br#"["application/json","application/xml","text/json","test/xml","*/*",none]"#.to_vec()
            ),
        ]
    );

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error initialising request");
}

#[test]
fn test_write_failure_is_reported() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::failing();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| Reply::value(Resource { id: 1, name: "x" }),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::OK));

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error writing response");
    assert_eq!(reported[0].error.as_deref(), Some("closed"));
    assert_eq!(
        reported[0].help.as_deref(),
        Some("(response: 200 OK): write error: closed")
    );
}

#[test]
fn test_unmarshallable_result_is_500() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| ApiResult::ok().with_value(Unmarshallable).into(),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(writer.header("Content-Type"), Some("application/json"));
    assert!(
        writer.body().contains("error marshalling response: "),
        "{}",
        writer.body()
    );

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error marshalling Result response");
}

#[test]
fn test_unmarshallable_error_falls_back_to_plain_text() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let endware = endware.with_projection(Arc::new(|_: &ErrorInfo<'_>| -> Box<dyn Content> {
        Box::new(Unmarshallable)
    }));
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| ApiError::not_found().with_message("missing id").into(),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(writer.header("Content-Type"), Some("plain/text"));
    let body = writer.body();
    assert!(body.starts_with("An error occurred marshalling an error response"), "{}", body);
    assert!(body.ends_with("The original error was:\n   404 Not Found: missing id"), "{}", body);

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error marshalling error response");
}

#[test]
fn test_panicking_projection_falls_back_to_plain_text() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let endware = endware.with_projection(Arc::new(|_: &ErrorInfo<'_>| -> Box<dyn Content> {
        panic!("projection bug")
    }));
    let mut writer = RecordingWriter::new();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        endware.serve(
            &request("/v1/resources", None, ""),
            |_| ApiError::not_found().into(),
            &mut writer,
        )
    }));

    assert!(outcome.is_ok());
    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(writer.header("Content-Type"), Some("plain/text"));
    let body = writer.body();
    assert!(body.contains("panic: projection bug"), "{}", body);
    assert!(
        body.ends_with("The original error was:\n   500 Internal Server Error: panic: projection bug"),
        "{}",
        body
    );

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0].message, "handler panic");
    assert_eq!(reported[1].message, "error building fault response");
}

#[test]
fn test_out_of_range_status_is_a_fault() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| Reply::Status(600),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(writer.header("Content-Type"), Some("application/json"));
    let body = writer.body();
    assert!(
        body.contains(r#""message":"invalid status code: 600: valid range is 1xx-5xx""#),
        "{}",
        body
    );

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error building response");
}

#[test]
fn test_bare_status_has_no_body() {
    let (endware, _) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| Reply::Status(202),
        &mut writer,
    );

    assert_eq!(
        writer.calls,
        vec![Call::Commit(StatusCode::ACCEPTED), Call::Body(Vec::new())]
    );
}

#[test]
fn test_problem_bypasses_negotiation() {
    let (endware, _) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", Some("text/xml"), ""),
        |_| Problem::from_status(404).unwrap().into(),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(writer.header("Content-Type"), Some("application/problem+json"));
    assert_eq!(writer.body(), r#"{"detail":"Not Found","status":404}"#);
}

#[test]
fn test_empty_problem_is_a_fault() {
    let (endware, reported) = recording_endware(EndwareConfig::default());
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", None, ""),
        |_| Problem::new().into(),
        &mut writer,
    );

    assert_eq!(writer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message, "error building response");
}

#[test]
fn test_corrected_not_acceptable_body() {
    let mut config = EndwareConfig::default();
    config.negotiation.legacy_not_acceptable_body = false;
    let (endware, _) = recording_endware(config);
    let mut writer = RecordingWriter::new();

    endware.serve(
        &request("/v1/resources", Some("text/html"), ""),
        |_| Reply::Status(200),
        &mut writer,
    );

    let body: Vec<String> = serde_json::from_str(&writer.body()).unwrap();
    assert_eq!(
        body,
        vec!["application/json", "application/xml", "text/json", "text/xml"]
    );
}
