//! Axum integration.
//!
//! # Responsibilities
//! - Adapt endpoint functions into axum routes
//! - Buffer request bodies up to the configured limit
//! - Wire up middleware (tracing, timeout) and serve with graceful shutdown
//!
//! # Design Decisions
//! - The body is buffered before the endpoint runs so endpoints stay
//!   synchronous and can read it any number of times
//! - A body that cannot be read is still answered through the pipeline, as a
//!   failure reply, so it gets the same error body and diagnostics as any
//!   other fault

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::Request;
use axum::routing::{any, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::endware::Endware;
use crate::error::EndwareError;
use crate::http::writer::BufferedWriter;
use crate::reply::Reply;

/// Adapt an endpoint function into an axum route accepting any method.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use axum::Router;
/// use endware::http::server::endpoint;
/// use endware::{ApiResult, Endware, Reply};
///
/// let endware = Arc::new(Endware::default());
/// let app: Router = Router::new().route(
///     "/ping",
///     endpoint(endware, |_| Reply::from(ApiResult::ok().with_value("pong"))),
/// );
/// ```
pub fn endpoint<S, F>(endware: Arc<Endware>, f: F) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(&Request<Bytes>) -> Reply + Clone + Send + Sync + 'static,
{
    any(move |request: Request<Body>| {
        let endware = endware.clone();
        let f = f.clone();
        async move { handle(&endware, request, f).await }
    })
}

/// Buffer the request body, then serve `f` into an axum response.
pub async fn handle<F>(endware: &Endware, request: Request<Body>, f: F) -> axum::response::Response
where
    F: FnOnce(&Request<Bytes>) -> Reply,
{
    let (parts, body) = request.into_parts();
    let mut writer = BufferedWriter::new();

    match axum::body::to_bytes(body, endware.config().body.max_bytes).await {
        Ok(bytes) => {
            let request = Request::from_parts(parts, bytes);
            endware.serve(&request, f, &mut writer);
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %parts.uri.path(), "Failed to read request body");
            let message = e.to_string();
            let request = Request::from_parts(parts, Bytes::new());
            endware.serve(
                &request,
                move |_| Reply::failure(EndwareError::ReadBody(message)),
                &mut writer,
            );
        }
    }

    writer.into_response()
}

/// Add the standard middleware stack to an application router.
#[allow(deprecated)]
pub fn with_middleware(router: Router, config: &ServerConfig) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` until Ctrl+C.
pub async fn run(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
