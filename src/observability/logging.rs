//! Structured logging and the internal diagnostic hook.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries
//! - Define the `InternalError` snapshot handed to the diagnostic hook
//! - Provide a tracing-backed hook implementation
//!
//! # Design Decisions
//! - The library never logs internal errors on its own; it hands them to a
//!   hook, which is a no-op unless the application installs one
//! - Uses tracing crate for structured logging

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::http::request::RequestInfo;

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "endware=debug,tower_http=debug";

/// A failure inside the response pipeline itself.
///
/// Snapshots are created once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalError {
    pub message: String,
    pub error: Option<String>,
    pub help: Option<String>,
    pub request: Option<RequestInfo>,
    pub content_type: Option<String>,
}

/// Receives every internal error.
pub type DiagnosticHook = Arc<dyn Fn(&InternalError) + Send + Sync>;

/// A hook that discards everything.
pub fn noop_hook() -> DiagnosticHook {
    Arc::new(|_: &InternalError| {})
}

/// A hook that emits each internal error as a `tracing` error event.
pub fn tracing_hook() -> DiagnosticHook {
    Arc::new(|e: &InternalError| {
        let (method, path) = e
            .request
            .as_ref()
            .map(|rq| (rq.method.to_string(), rq.path.clone()))
            .unwrap_or_default();

        tracing::error!(
            method = %method,
            path = %path,
            error = e.error.as_deref().unwrap_or(""),
            help = e.help.as_deref().unwrap_or(""),
            content_type = e.content_type.as_deref().unwrap_or(""),
            "{}",
            e.message
        );
    })
}

/// Install the global subscriber: `EnvFilter` from `RUST_LOG` (or the given
/// fallback) plus the fmt layer.
pub fn init(fallback: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
