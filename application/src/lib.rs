//! Application provides HTTP API guarded by the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;
pub mod middleware;
pub mod session;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use axum_client_ip::SecureClientIpSource;
// Used in binary.
use futures as _;
use tower_http as _;
use tracing_subscriber as _;
#[cfg(test)]
use {common as _, tower as _};

pub use self::{
    args::Args,
    config::Config,
    context::{AuthError, Context},
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::audit::Queue>;

/// Builds the [`Router`] serving the HTTP API.
///
/// Every request, including the ones no endpoint serves, passes the rate
/// limiter first and the route guard second. Clients are told apart by the
/// provided `client_ip` source, if any.
#[must_use]
pub fn router(
    service: Service,
    transport: session::Transport,
    client_ip: Option<SecureClientIpSource>,
) -> Router {
    Router::new()
        .route(
            "/api/auth/session",
            get(api::auth::get_session).delete(api::auth::sign_out),
        )
        .route(
            "/api/admin/session",
            get(api::admin::get_session).delete(api::admin::sign_out),
        )
        .route("/api/admin/activity", post(api::admin::log_activity))
        .fallback(api::not_found)
        .layer(axum::middleware::from_fn(middleware::guard))
        .layer(axum::middleware::from_fn(middleware::rate_limit))
        .layer(Extension(client_ip))
        .layer(Extension(transport))
        .layer(Extension(service))
}
