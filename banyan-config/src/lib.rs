//! Configuration for banyan-shield.
//!
//! All settings come from `BANYAN_`-prefixed environment variables, optionally
//! seeded from a `.env` file. Only the runtime mode changes which policy is
//! emitted; the reporting settings feed the optional violation forwarding.
//!
//! | Variable | Default |
//! |---|---|
//! | `BANYAN_ENV` (falls back to `NODE_ENV`) | `development` |
//! | `BANYAN_HOST` | `0.0.0.0` |
//! | `BANYAN_PORT` | `3000` |
//! | `BANYAN_CSP_REPORT_ONLY` | `false` |
//! | `BANYAN_CSP_STRICT` | `false` |
//! | `BANYAN_LOGGING_ENDPOINT` | unset |
//! | `BANYAN_LOGGING_TOKEN` | unset |
//! | `BANYAN_SENTRY_DSN` | unset |
//! | `BANYAN_FORWARD_TIMEOUT_MS` | `5000` |
//! | `BANYAN_MAX_REPORT_BYTES` | `65536` |
//!
//! ```
//! use banyan_config::ShieldConfig;
//! use banyan_core::RuntimeMode;
//!
//! let config = ShieldConfig::from_lookup(|key| match key {
//!     "BANYAN_ENV" => Some("production".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.mode, RuntimeMode::Production);
//! assert_eq!(config.port, 3000);
//! ```

pub mod env;
pub mod error;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use validation::Validate;

use banyan_core::RuntimeMode;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Prefix shared by every banyan environment variable.
pub const ENV_PREFIX: &str = "BANYAN";

/// Settings for the violation-report endpoint and its forwarding sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingConfig {
    /// External log collector receiving forwarded violations
    pub logging_endpoint: Option<String>,

    /// Bearer credential for the log collector
    pub logging_token: Option<String>,

    /// Error-tracking DSN violations are mirrored to
    pub sentry_dsn: Option<String>,

    /// Per-request timeout for forwarding calls
    pub forward_timeout: Duration,

    /// Largest accepted report body
    pub max_report_bytes: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            logging_endpoint: None,
            logging_token: None,
            sentry_dsn: None,
            forward_timeout: Duration::from_millis(5000),
            max_report_bytes: 64 * 1024,
        }
    }
}

impl ReportingConfig {
    /// Whether any forwarding sink is configured
    pub fn forwarding_enabled(&self) -> bool {
        self.logging_endpoint.is_some() || self.sentry_dsn.is_some()
    }

    fn from_loader(env: &EnvLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            logging_endpoint: env.get("logging_endpoint"),
            logging_token: env.get("logging_token"),
            sentry_dsn: env.get("sentry_dsn"),
            forward_timeout: env
                .parse_var::<u64>("forward_timeout_ms")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.forward_timeout),
            max_report_bytes: env
                .parse_var::<usize>("max_report_bytes")?
                .unwrap_or(defaults.max_report_bytes),
        })
    }
}

impl Validate for ReportingConfig {
    fn validate(&self) -> Result<()> {
        if let Some(ref endpoint) = self.logging_endpoint {
            validation::http_url(endpoint, "BANYAN_LOGGING_ENDPOINT")?;
        }
        validation::in_range(
            self.forward_timeout.as_millis() as u64,
            1,
            60_000,
            "BANYAN_FORWARD_TIMEOUT_MS",
        )?;
        validation::in_range(
            self.max_report_bytes,
            1024,
            16 * 1024 * 1024,
            "BANYAN_MAX_REPORT_BYTES",
        )?;
        Ok(())
    }
}

/// Top-level process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldConfig {
    pub mode: RuntimeMode,
    pub host: IpAddr,
    pub port: u16,

    /// Emit `Content-Security-Policy-Report-Only` instead of enforcing
    pub report_only: bool,

    /// Emit the nonce-scoped strict policy with a fresh nonce per response
    pub strict_csp: bool,

    pub reporting: ReportingConfig,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Development,
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            report_only: false,
            strict_csp: false,
            reporting: ReportingConfig::default(),
        }
    }
}

impl ShieldConfig {
    /// Load `.env` (if present) and then read the process environment.
    pub fn from_env() -> Result<Self> {
        load_dotenv(None)?;
        Self::from_loader(&EnvLoader::new(Some(ENV_PREFIX)))
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self::from_loader(&EnvLoader::with_lookup(Some(ENV_PREFIX), lookup))
    }

    fn from_loader(env: &EnvLoader) -> Result<Self> {
        let defaults = Self::default();

        let mode = match env.get("env").or_else(|| env.raw("NODE_ENV")) {
            Some(value) => value
                .parse::<RuntimeMode>()
                .map_err(|e| ConfigError::invalid("BANYAN_ENV", &value, e.to_string()))?,
            None => defaults.mode,
        };

        let config = Self {
            mode,
            host: env.parse_var::<IpAddr>("host")?.unwrap_or(defaults.host),
            port: env.parse_var::<u16>("port")?.unwrap_or(defaults.port),
            report_only: env.load_bool("csp_report_only")?.unwrap_or(false),
            strict_csp: env.load_bool("csp_strict")?.unwrap_or(false),
            reporting: ReportingConfig::from_loader(env)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Validate for ShieldConfig {
    fn validate(&self) -> Result<()> {
        self.reporting.validate()
    }
}

/// Load variables from a `.env` file into the process environment.
///
/// With `None` the default `.env` lookup is used and a missing file is not an
/// error. An explicit path must exist.
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e))),
        None => match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded .env file");
                Ok(())
            }
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(ConfigError::Load(e.to_string())),
        },
    }
}
