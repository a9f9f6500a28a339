//! Demo server for the endware response pipeline.
//!
//! Exposes one route per kind of endpoint reply:
//!
//! | Route            | Reply                                   |
//! |------------------|-----------------------------------------|
//! | `GET /widgets`   | value, marshalled per `Accept`          |
//! | `POST /widgets`  | strict JSON decode, then `201 Created`  |
//! | `GET /missing`   | `404` error with message and property   |
//! | `GET /problem`   | RFC 7807 problem                        |
//! | `GET /bytes`     | raw octet stream                        |
//! | `GET /accepted`  | bare status code                        |
//! | `GET /failure`   | generic error, sent as `500`            |
//! | `GET /panic`     | endpoint panic, caught and sent as `500`|

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, Request};
use axum::Router;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use url::Url;

use endware::config::{load_config, validation::validate_config, EndwareConfig};
use endware::http::request::decode_body_strict;
use endware::http::server::{self, endpoint};
use endware::observability::logging;
use endware::{ApiError, ApiResult, Endware, Problem, Reply};

#[derive(Parser, Debug)]
#[command(name = "endware-demo")]
#[command(about = "Demo API server for the endware response pipeline", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration file
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "widget", deny_unknown_fields)]
struct Widget {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "widgets")]
struct Widgets {
    widget: Vec<Widget>,
}

fn list_widgets(_: &Request<Bytes>) -> Reply {
    Reply::value(Widgets {
        widget: vec![
            Widget { id: 1, name: "sprocket".into() },
            Widget { id: 2, name: "gear".into() },
        ],
    })
}

fn create_widget(request: &Request<Bytes>) -> Reply {
    decode_body_strict(request, |widget: Option<Widget>| match widget {
        Some(widget) => ApiResult::created()
            .with_header("location", format!("/widgets/{}", widget.id))
            .with_value(widget)
            .into(),
        None => ApiError::bad_request().with_message("missing widget").into(),
    })
}

fn widgets(request: &Request<Bytes>) -> Reply {
    match *request.method() {
        Method::GET => list_widgets(request),
        Method::POST => create_widget(request),
        _ => Reply::Status(405),
    }
}

fn missing(request: &Request<Bytes>) -> Reply {
    ApiError::not_found()
        .with_message("missing id")
        .with_property("resource", "widget")
        .with_request(request)
        .into()
}

fn problem(_: &Request<Bytes>) -> Reply {
    let problem = Url::parse("https://example.com/probs/out-of-credit")
        .map_err(|e| e.to_string())
        .and_then(|url| {
            Problem::new()
                .with_type(url, &["You do not have enough credit."])
                .with_status(403)
                .map_err(|e| e.to_string())?
                .with_detail("Your current balance is 30, but that costs 50.")
                .with_property("balance", 30)
                .map_err(|e| e.to_string())
        });

    match problem {
        Ok(problem) => problem.into(),
        Err(e) => Reply::failure(e),
    }
}

fn bytes(_: &Request<Bytes>) -> Reply {
    b"\x00\x01\x02\x03".to_vec().into()
}

fn accepted(_: &Request<Bytes>) -> Reply {
    Reply::Status(202)
}

fn failure(_: &Request<Bytes>) -> Reply {
    Reply::failure(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "database unavailable",
    ))
}

fn panics(_: &Request<Bytes>) -> Reply {
    panic!("boom")
}

fn build_router(endware: Arc<Endware>) -> Router {
    Router::new()
        .route("/widgets", endpoint(endware.clone(), widgets))
        .route("/missing", endpoint(endware.clone(), missing))
        .route("/problem", endpoint(endware.clone(), problem))
        .route("/bytes", endpoint(endware.clone(), bytes))
        .route("/accepted", endpoint(endware.clone(), accepted))
        .route("/failure", endpoint(endware.clone(), failure))
        .route("/panic", endpoint(endware, panics))
}

fn load(args: &Args) -> Result<EndwareConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EndwareConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.server.bind_address = bind.clone();
        if let Err(errors) = validate_config(&config) {
            let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(errors.join(", ").into());
        }
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(logging::DEFAULT_FILTER);

    let args = Args::parse();
    let config = load(&args)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        max_body_bytes = config.body.max_bytes,
        legacy_not_acceptable_body = config.negotiation.legacy_not_acceptable_body,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let endware = Arc::new(Endware::new(config.clone()));
    let router = server::with_middleware(build_router(endware), &config.server);

    server::run(listener, router).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
