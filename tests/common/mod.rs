//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde::{Serialize, Serializer};

use endware::http::ResponseWriter;
use endware::{Endware, EndwareConfig, InternalError};

/// One call made on a [`RecordingWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Header(String, String),
    Commit(StatusCode),
    Body(Vec<u8>),
}

/// Records every transport call in order. Body writes fail when
/// `fail_body` is set.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub calls: Vec<Call>,
    pub fail_body: bool,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            fail_body: true,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.calls.iter().find_map(|c| match c {
            Call::Commit(status) => Some(*status),
            _ => None,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.calls.iter().find_map(|c| match c {
            Call::Header(k, v) if k == name => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn body(&self) -> String {
        self.calls
            .iter()
            .find_map(|c| match c {
                Call::Body(b) => Some(String::from_utf8_lossy(b).into_owned()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl ResponseWriter for RecordingWriter {
    fn set_header(&mut self, name: &str, value: &str) {
        self.calls.push(Call::Header(name.to_string(), value.to_string()));
    }

    fn commit(&mut self, status: StatusCode) {
        self.calls.push(Call::Commit(status));
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        if self.fail_body {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.calls.push(Call::Body(body.to_vec()));
        Ok(())
    }
}

/// A value that never serializes.
pub struct Unmarshallable;

impl Serialize for Unmarshallable {
    fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot be marshalled"))
    }
}

/// An endware with a fixed clock (2012-11-10T09:08:07Z) whose diagnostic
/// hook records every internal error.
pub fn recording_endware(config: EndwareConfig) -> (Endware, Arc<Mutex<Vec<InternalError>>>) {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let endware = Endware::new(config)
        .with_clock(Arc::new(|| Utc.with_ymd_and_hms(2012, 11, 10, 9, 8, 7).unwrap()))
        .with_diagnostics(Arc::new(move |e: &InternalError| {
            sink.lock().unwrap().push(e.clone());
        }));
    (endware, reported)
}

/// A buffered request with an optional `Accept` header.
pub fn request(uri: &str, accept: Option<&str>, body: &str) -> Request<Bytes> {
    let mut builder = Request::builder().uri(uri);
    if let Some(accept) = accept {
        builder = builder.header("Accept", accept);
    }
    builder.body(Bytes::from(body.to_string())).unwrap()
}
