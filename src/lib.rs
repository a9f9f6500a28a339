//! Response dispatch for JSON/XML HTTP APIs.
//!
//! Endpoint functions return a [`Reply`]; the [`Endware`] pipeline
//! negotiates the response format from the `Accept` header, builds a
//! [`Response`] from the reply, and writes it to the transport. Errors are
//! projected into a uniform body, RFC 7807 problems are always sent as
//! `application/problem+json`, and any panic in an endpoint is answered with
//! a `500` instead of tearing down the connection.
//!
//! # Architecture Overview
//!
//! ```text
//!     request ──▶ http::server ──▶ Endware::serve ──▶ negotiate
//!                                        │
//!                                        ▼
//!                          endpoint(&Request<Bytes>) -> Reply
//!                                        │   (fault barrier)
//!                                        ▼
//!                  ApiRequest::respond ──▶ ApiResult / ApiError / Problem
//!                                        │
//!                                        ▼
//!     response ◀── ResponseWriter ◀── Response::write
//! ```

// Core pipeline
pub mod endware;
pub mod http;
pub mod reply;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::EndwareConfig;
pub use endware::{Clock, Endware};
pub use error::{EndwareError, InvalidStatusCode};
pub use http::{ApiRequest, Response};
pub use observability::{DiagnosticHook, InternalError};
pub use reply::{ApiError, ApiResult, Content, Problem, Reply};
