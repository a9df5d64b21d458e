//! Sliding-window [`RateLimiter`].

use std::{
    collections::{HashMap, VecDeque},
    net::IpAddr,
    sync::Arc,
    time::Duration,
};

use derive_more::{Display, From};
use smart_default::SmartDefault;
use tokio::{sync::Mutex, time::Instant};
use tracing as log;

/// [`RateLimiter`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Maximum number of requests admitted per key within the `window`.
    #[default(100)]
    pub limit: usize,

    /// Length of the trailing window.
    #[default(Duration::from_secs(15 * 60))]
    pub window: Duration,
}

/// Key identifying a rate-limited client.
#[derive(Clone, Debug, Display, Eq, From, Hash, PartialEq)]
#[from(&str, String)]
pub struct Key(String);

impl Key {
    /// Shared [`Key`] of clients whose address is unknown.
    pub const UNKNOWN: &'static str = "unknown";

    /// Creates a new [`Key`] out of the provided client address.
    ///
    /// Clients without a known address share the single
    /// [`Key::UNKNOWN`] bucket.
    #[must_use]
    pub fn from_ip(ip: Option<IpAddr>) -> Self {
        ip.map_or_else(
            || {
                log::warn!(
                    "client address is unknown, falling back to the shared \
                     `{}` rate limit bucket",
                    Self::UNKNOWN,
                );
                Self(Self::UNKNOWN.to_owned())
            },
            |ip| Self(ip.to_string()),
        )
    }
}

/// Decision of a [`RateLimiter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Request is admitted.
    Admitted {
        /// Number of requests still admitted within the current window.
        remaining: usize,
    },

    /// Request is rejected.
    Rejected {
        /// Time after which a request will be admitted again.
        retry_after: Duration,
    },
}

impl Decision {
    /// Indicates whether the request is admitted.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Sliding-window rate limiter.
///
/// Keeps timestamps of admitted requests per [`Key`]. The whole
/// prune-check-append sequence runs under a single lock, so concurrent
/// requests cannot be admitted past the limit.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    /// [`Config`] of this [`RateLimiter`].
    config: Config,

    /// Timestamps of admitted requests per [`Key`], oldest first.
    windows: Arc<Mutex<HashMap<Key, VecDeque<Instant>>>>,
}

impl RateLimiter {
    /// Creates a new [`RateLimiter`] with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            windows: Arc::default(),
        }
    }

    /// Returns [`Config`] of this [`RateLimiter`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks a request of the provided [`Key`] made right now.
    pub async fn check(&self, key: &Key) -> Decision {
        self.check_at(key, Instant::now()).await
    }

    /// Checks a request of the provided [`Key`] made at the provided moment.
    pub async fn check_at(&self, key: &Key, now: Instant) -> Decision {
        let Config { limit, window } = self.config;

        let mut windows = self.windows.lock().await;
        let stamps = windows.entry(key.clone()).or_default();
        prune(stamps, now, window);

        if stamps.len() >= limit {
            let retry_after = stamps.front().map_or(window, |oldest| {
                window.saturating_sub(now.saturating_duration_since(*oldest))
            });
            log::warn!(
                key = %key,
                limit,
                retry_after = retry_after.as_secs(),
                "rate limit exceeded",
            );
            return Decision::Rejected { retry_after };
        }

        stamps.push_back(now);
        Decision::Admitted {
            remaining: limit - stamps.len(),
        }
    }

    /// Prunes outdated timestamps of every [`Key`] and forgets [`Key`]s
    /// having none left.
    ///
    /// Returns the number of forgotten [`Key`]s.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let window = self.config.window;

        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, stamps| {
            prune(stamps, now, window);
            !stamps.is_empty()
        });
        before - windows.len()
    }

    /// Forgets every tracked request.
    pub async fn reset(&self) {
        self.windows.lock().await.clear();
    }
}

/// Drops timestamps lying outside the `window` trailing `now`.
fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while stamps
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) > window)
    {
        _ = stamps.pop_front();
    }
}
