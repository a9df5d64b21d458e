//! HTTP middleware guarding every request.

use std::time::Duration;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse as _, Redirect, Response},
    Extension,
};
use axum_client_ip::{
    InsecureClientIp, SecureClientIp, SecureClientIpSource,
};
use axum_extra::extract::CookieJar;
use http::HeaderName;
use service::{
    command::{self, Command as _},
    domain::route::{Decision, Denial, Reason},
    rate_limit,
};

use crate::{
    context::AuthError, define_error, session::Transport, AsError as _, Error,
    Service,
};

/// Prefix of paths answered with JSON rather than pages.
const API_PREFIX: &str = "/api/";

/// Header carrying the number of requests admitted per window.
pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";

/// Header carrying the number of requests still admitted in the current
/// window.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Admits the request unless its client exceeded the rate limit.
///
/// Reports the limit and the requests left within the current window in
/// [`RATE_LIMIT_LIMIT`] and [`RATE_LIMIT_REMAINING`] headers.
pub async fn rate_limit(
    Extension(service): Extension<Service>,
    Extension(client_ip): Extension<Option<SecureClientIpSource>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = match &client_ip {
        Some(source) => {
            SecureClientIp::from(source, req.headers(), req.extensions())
                .ok()
                .map(|ip| ip.0)
        }
        None => InsecureClientIp::from(req.headers(), req.extensions())
            .ok()
            .map(|ip| ip.0),
    };
    let key = rate_limit::Key::from_ip(ip);

    let limiter = service.rate_limiter();
    let (mut res, remaining) = match limiter.check(&key).await {
        rate_limit::Decision::Admitted { remaining } => {
            (next.run(req).await, remaining)
        }
        rate_limit::Decision::Rejected { retry_after } => {
            (too_many_requests(retry_after), 0)
        }
    };

    let headers = res.headers_mut();
    drop(headers.insert(
        HeaderName::from_static(RATE_LIMIT_LIMIT),
        limiter.config().limit.into(),
    ));
    drop(headers.insert(
        HeaderName::from_static(RATE_LIMIT_REMAINING),
        remaining.into(),
    ));
    res
}

/// Renders a rejection of the rate limiter.
fn too_many_requests(retry_after: Duration) -> Response {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    let mut res = Error::from(RateLimitError::TooManyRequests).into_response();
    drop(
        res.headers_mut()
            .insert(http::header::RETRY_AFTER, secs.max(1).into()),
    );
    res
}

/// Passes the request only if its session may access the requested route.
pub async fn guard(
    Extension(service): Extension<Service>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let tokens = Transport::tokens(&CookieJar::from_headers(req.headers()));

    match service
        .execute(command::AuthorizeRoute {
            path: path.clone(),
            tokens,
        })
        .await
    {
        Ok(Decision::Allowed) => next.run(req).await,
        Ok(Decision::Denied(denial)) => deny(&path, denial),
        Err(e) => e.into_error().into_response(),
    }
}

/// Renders a [`Denial`] as a JSON error for API paths, or as a redirect for
/// pages.
fn deny(path: &str, denial: Denial) -> Response {
    let Denial { reason, redirect } = denial;
    if path.starts_with(API_PREFIX) {
        Error::from(match reason {
            Reason::Unauthenticated => AuthError::Unauthenticated,
            Reason::Forbidden => AuthError::Forbidden,
        })
        .into_response()
    } else {
        Redirect::temporary(&redirect).into_response()
    }
}

define_error! {
    enum RateLimitError {
        #[code = "TOO_MANY_REQUESTS"]
        #[status = TOO_MANY_REQUESTS]
        #[message = "Too many requests, please try again later"]
        TooManyRequests,
    }
}
