//! [`Config`]-related definitions.

use std::time;

use axum_client_ip::SecureClientIpSource;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use service::domain::route;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// [`Deployment`] the server runs in.
    pub deployment: Deployment,

    /// Trusted source of client addresses keying the rate limit.
    ///
    /// If [`None`], the address is taken from the first of the forwarding
    /// headers present, falling back to the peer address. Such headers are
    /// client-controlled, so a proxy-specific source should be configured
    /// whenever the server runs behind one.
    pub client_ip: Option<SecureClientIpSource>,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Kind of environment the server is deployed into.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// Local development, served over plain HTTP.
    Development,

    /// Production-like environment, served over HTTPS only.
    #[default]
    Production,
}

impl Deployment {
    /// Indicates whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] signing secret.
    ///
    /// Required: the server refuses to start without it.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[serde(deserialize_with = "secret")]
    pub jwt_secret: Option<SecretString>,

    /// Rate limit configuration.
    pub rate_limit: RateLimit,

    /// Route guard configuration.
    pub routes: Routes,

    /// Audit log configuration.
    pub audit: Audit,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            rate_limit: RateLimit { limit, window },
            routes: Routes { rules, pages },
            audit: _,
            tasks: Tasks { prune_rate_limits },
        } = value;

        let Pages {
            sign_in,
            admin_sign_in,
            landing,
        } = pages;

        Self {
            jwt: jwt_secret.as_ref().and_then(service::Jwt::from_secret),
            guard: route::Guard {
                table: rules.map(route::Table::new).unwrap_or_default(),
                pages: route::Pages {
                    sign_in,
                    admin_sign_in,
                    landing,
                },
            },
            rate_limit: service::rate_limit::Config { limit, window },
            prune_rate_limits: service::task::prune_rate_limits::Config {
                interval: prune_rate_limits.interval,
            },
        }
    }
}

/// Deserializes an optional secret without keeping a plain copy around.
fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Rate limit configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RateLimit {
    /// Maximum number of requests admitted per client within the `window`.
    #[default(100)]
    pub limit: usize,

    /// Length of the trailing window.
    #[default(time::Duration::from_secs(15 * 60))]
    #[serde(with = "humantime_serde")]
    pub window: time::Duration,
}

/// Route guard configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Routes {
    /// Ordered route rules replacing the built-in table, if any.
    pub rules: Option<Vec<route::Rule>>,

    /// Redirect pages.
    pub pages: Pages,
}

/// Redirect pages configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Pages {
    /// Sign-in page of regular users.
    #[default("/sign-in".to_owned())]
    pub sign_in: String,

    /// Sign-in page of administrators.
    #[default("/admin/sign-in".to_owned())]
    pub admin_sign_in: String,

    /// Page authenticated but unauthorized requests are sent to.
    #[default("/".to_owned())]
    pub landing: String,
}

/// Audit log configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Audit {
    /// Maximum number of entries waiting to be written.
    #[default(1024)]
    pub capacity: usize,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `PruneRateLimits` task configuration.
    pub prune_rate_limits: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
