//! Service contains the access-control logic of the application.
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
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod rate_limit;
pub mod task;

use common::operations::{By, Start};
use derive_more::Debug;
use secrecy::{ExposeSecret as _, SecretString};

#[cfg(doc)]
use infra::Audit;

pub use self::{command::Command, rate_limit::RateLimiter, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] keys signing and verifying session tokens.
    ///
    /// [`None`] if no signing secret is configured, in which case no token
    /// can be issued nor verified.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    pub jwt: Option<Jwt>,

    /// Route guard policy.
    pub guard: domain::route::Guard,

    /// [`RateLimiter`] configuration.
    pub rate_limit: rate_limit::Config,

    /// [`task::PruneRateLimits`] configuration.
    pub prune_rate_limits: task::prune_rate_limits::Config,
}

/// [JWT] keys derived from a shared secret.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Clone, Debug)]
pub struct Jwt {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub decoding_key: jsonwebtoken::DecodingKey,
}

impl Jwt {
    /// Derives [`Jwt`] keys from the provided `secret`.
    ///
    /// [`None`] is returned if the `secret` is empty.
    #[must_use]
    pub fn from_secret(secret: &SecretString) -> Option<Self> {
        let secret = secret.expose_secret().as_bytes();
        (!secret.is_empty()).then(|| Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
        })
    }
}

/// Access-control service.
#[derive(Clone, Debug)]
pub struct Service<A> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Audit`] log of this [`Service`].
    audit: A,

    /// [`RateLimiter`] of this [`Service`].
    rate_limiter: RateLimiter,
}

impl<A> Service<A> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its maintenance [`Task`]s.
    pub fn new(config: Config, audit: A) -> (Self, task::Background)
    where
        Self: Clone + 'static,
    {
        let rate_limiter = RateLimiter::new(config.rate_limit);
        let this = Service {
            config,
            audit,
            rate_limiter,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("prune_rate_limits", async move {
            svc.execute(Start(By::<task::PruneRateLimits, _>::new(
                svc.config().prune_rate_limits,
            )))
            .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Audit`] log of this [`Service`].
    #[must_use]
    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Returns [`RateLimiter`] of this [`Service`].
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
