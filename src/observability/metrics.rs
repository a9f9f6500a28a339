//! Response metrics.
//!
//! # Metrics
//! - `endware_responses_total` (counter): written responses by status, kind
//! - `endware_internal_errors_total` (counter): internal errors by stage
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the application installs a recorder
//!   (updates are no-ops without one)

use axum::http::StatusCode;

/// Record a written response.
pub fn record_response(status: u16, kind: &'static str) {
    metrics::counter!(
        "endware_responses_total",
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record an internal error at the given pipeline stage.
pub fn record_internal_error(stage: &'static str) {
    metrics::counter!("endware_internal_errors_total", "stage" => stage).increment(1);
}

/// Coarse classification of a status code for labelling.
pub fn kind_of(status: StatusCode) -> &'static str {
    if status.is_informational() {
        "informational"
    } else if status.is_success() {
        "success"
    } else if status.is_redirection() {
        "redirection"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "server_error"
    }
}
