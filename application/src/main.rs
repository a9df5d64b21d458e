use std::{
    future::IntoFuture as _,
    io,
    net::SocketAddr,
    process::ExitCode,
    sync::OnceLock,
    time,
};

use application::{config, session::Transport, Args, Config};
use axum::{
    extract::{MatchedPath, Request},
    response::Response,
};
use axum_client_ip::InsecureClientIp;
use futures::{future, TryFutureExt as _};
use service::{infra::audit, Service};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to stderr rather than stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Configured maximum log level, [`log::Level::INFO`] until loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

/// Installs stdout and stderr log layers.
fn init_logging() {
    tracing_subscriber::registry()
        .with(log_layer(false))
        .with(log_layer(true))
        .init();
}

/// Builds a log layer writing either [`STDERR_LEVELS`] into stderr, or every
/// other level into stdout.
fn log_layer<S>(stderr: bool) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(move || -> Box<dyn io::Write> {
            if stderr {
                Box::new(io::stderr())
            } else {
                Box::new(io::stdout())
            }
        })
        .with_filter(filter_fn(move |meta| {
            let level = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == stderr
                    && level >= *meta.level())
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let audit_capacity = service.audit.capacity;
    let service: service::Config = service.into();
    if service.jwt.is_none() {
        log::error!("`service.jwt_secret` is not configured, refusing to start");
        return Err(());
    }

    let (queue, drain) = audit::Queue::new(audit::Tracing, audit_capacity);
    let (service, mut background) = Service::new(service, queue);
    background.spawn("audit_drain", drain.run());

    if !server.deployment.is_production() {
        log::warn!("session cookies are not restricted to HTTPS");
    }
    let transport = Transport::new(server.deployment.is_production());

    let client_ip = server.client_ip.clone();
    let app = application::router(service, transport, client_ip)
        .layer(cors(&server.cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response),
        );

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    future::try_join(
        serve
            .into_future()
            .map_err(|e| log::error!("webserver failed: {e}")),
        background.into_future().map_err(|e| {
            log::error!("background task failed: {e}");
        }),
    )
    .await
    .map(drop)
}

/// Builds the [CORS] layer allowing the configured origins.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
fn cors(config: &config::Cors) -> Result<CorsLayer, ()> {
    let mut cors = CorsLayer::new()
        .allow_methods([
            http::Method::DELETE,
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE]);
    for origin in &config.origins {
        cors = cors.allow_origin(
            origin.parse::<http::header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not correct CORS origin: {e}");
            })?,
        );
    }
    Ok(cors)
}

/// Opens the span of an HTTP request.
fn request_span(r: &Request) -> tracing::Span {
    tracing::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = r.uri().path(),
        http.user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Records the status of an HTTP response into its request span.
fn record_response(r: &Response, dur: time::Duration, span: &tracing::Span) {
    _ = span.record(
        "http.status_code",
        tracing::field::display(r.status().as_u16()),
    );

    let duration = format!("{}ms", dur.as_millis());
    if r.status().is_server_error() {
        log::error!(duration = %duration);
    } else {
        log::info!(duration = %duration);
    }
}
