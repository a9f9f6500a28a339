//! Composition root and request entry point.
//!
//! # Responsibilities
//! - Own the configuration and the replaceable hooks (clock, diagnostics,
//!   error projection)
//! - Negotiate, invoke the endpoint under a fault barrier, dispatch the
//!   reply and write the response
//!
//! # Design Decisions
//! - Hooks are configured once before serving and read-only afterwards; no
//!   internal synchronisation beyond `Arc`
//! - A negotiation failure short-circuits with a fixed 406 and the endpoint is
//!   never called
//! - Every fault in the endpoint or in dispatch becomes a single internal
//!   fault kind answered with a projected 500; nothing propagates to the
//!   caller
//! - If the projected 500 cannot be built either, the fixed plain-text 500
//!   is sent

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};

use crate::config::EndwareConfig;
use crate::error::EndwareError;
use crate::http::negotiate::{NegotiationError, DEFAULT_CONTENT_TYPE, SUPPORTED};
use crate::http::request::{ApiRequest, RequestInfo};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::observability::logging::{self, DiagnosticHook, InternalError};
use crate::observability::metrics;
use crate::reply::error::{fallback_response, ApiError};
use crate::reply::projection::{self, Projection};
use crate::reply::Reply;

/// 406 body sent for compatibility with existing clients, byte for byte.
pub const LEGACY_NOT_ACCEPTABLE_BODY: &str =
    r#"["application/json","application/xml","text/json","test/xml","*/*",none]"#;

/// Source of error timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The response pipeline, configured once at startup.
#[derive(Clone)]
pub struct Endware {
    pub(crate) config: EndwareConfig,
    pub(crate) clock: Clock,
    pub(crate) diagnostics: DiagnosticHook,
    pub(crate) projection: Projection,
}

impl Endware {
    /// Create a pipeline with default hooks: the system UTC clock, the default
    /// error projection, and a diagnostic hook that is a no-op unless
    /// `diagnostics.log_internal_errors` is set.
    pub fn new(config: EndwareConfig) -> Self {
        let diagnostics = if config.diagnostics.log_internal_errors {
            logging::tracing_hook()
        } else {
            logging::noop_hook()
        };

        Self {
            config,
            clock: Arc::new(Utc::now),
            diagnostics,
            projection: projection::default_projection(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticHook) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn config(&self) -> &EndwareConfig {
        &self.config
    }

    /// Handle one request: negotiate, call `endpoint`, write its reply.
    ///
    /// Never panics on behalf of the endpoint and never returns an error;
    /// every failure is answered on `writer` and reported to the diagnostic
    /// hook.
    pub fn serve<B, F, W>(&self, request: &Request<B>, endpoint: F, writer: &mut W)
    where
        F: FnOnce(&Request<B>) -> Reply,
        W: ResponseWriter + ?Sized,
    {
        let rq = match ApiRequest::new(request, self) {
            Ok(rq) => rq,
            Err(e) => {
                let info = RequestInfo::from_request(request);
                self.not_acceptable(&info, e).write(writer, &info, |e| self.report(e));
                return;
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rq.respond(endpoint(request))));
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => self.fault(&rq, "error building response", e),
            Err(payload) => self.fault(&rq, "handler panic", EndwareError::Fault(panic_message(payload.as_ref()))),
        };

        response.write(writer, rq.info(), |e| self.report(e));
    }

    fn report(&self, error: &InternalError) {
        (self.diagnostics)(error)
    }

    fn not_acceptable(&self, info: &RequestInfo, error: NegotiationError) -> Response {
        tracing::warn!(path = %info.path, error = %error, "Request not acceptable");
        metrics::record_internal_error("negotiate");
        self.report(&InternalError {
            message: "error initialising request".into(),
            error: Some(error.to_string()),
            help: None,
            request: Some(info.clone()),
            content_type: None,
        });

        let body = if self.config.negotiation.legacy_not_acceptable_body {
            LEGACY_NOT_ACCEPTABLE_BODY.to_string()
        } else {
            let types: Vec<String> = SUPPORTED.iter().map(|(ct, _)| format!("\"{}\"", ct)).collect();
            format!("[{}]", types.join(","))
        };
        Response::new(StatusCode::NOT_ACCEPTABLE, DEFAULT_CONTENT_TYPE, body.into_bytes())
    }

    fn fault(&self, rq: &ApiRequest<'_>, message: &str, error: EndwareError) -> Response {
        tracing::debug!(error = %error, "Converting fault to 500");
        metrics::record_internal_error("fault");
        self.report(&InternalError {
            message: message.into(),
            error: Some(error.to_string()),
            help: None,
            request: Some(rq.info().clone()),
            content_type: Some(rq.negotiation().content_type.into()),
        });
        let original = format!("500 Internal Server Error: {}", error);

        // The projection hook runs again here and may itself panic.
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            ApiError::internal_server_error()
                .with_cause(error)
                .into_response(rq)
        }));
        match built {
            Ok(response) => response,
            Err(payload) => {
                let failure = EndwareError::Fault(panic_message(payload.as_ref()));
                tracing::debug!(error = %failure, "Fault response failed; sending fallback body");
                metrics::record_internal_error("fault_response");
                self.report(&InternalError {
                    message: "error building fault response".into(),
                    error: Some(failure.to_string()),
                    help: Some(format!("the original error was: {}", original)),
                    request: Some(rq.info().clone()),
                    content_type: Some(rq.negotiation().content_type.into()),
                });
                fallback_response(&failure, &original)
            }
        }
    }
}

impl Default for Endware {
    fn default() -> Self {
        Self::new(EndwareConfig::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".into()
    }
}
