//! Configuration loading and validation for the checkout gateway.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use envelope::SecretKey;
use serde::Deserialize;

/// Validated gateway configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// 64-character hex AES-256 key used to seal and open tokens. **Required.**
    pub secret_key: String,

    /// Base URL of the downstream payment API, e.g. `https://api.example.com/v1`.
    /// **Required.**
    pub api_url: String,

    /// Default `x-api-key` sent to the payment API when a request carries none.
    #[serde(default)]
    pub api_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Per-call timeout (seconds) for requests to the payment API.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// OTLP endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    3000
}
fn default_upstream_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Parse the configured secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if `SECRET_KEY` is not 64 hex characters.
    pub fn secret_key(&self) -> Result<SecretKey> {
        // The envelope error may quote the offending character; keep key text out of logs.
        SecretKey::from_hex(&self.secret_key)
            .map_err(|_| anyhow::anyhow!("SECRET_KEY must be exactly 64 hex characters (32 bytes)"))
    }

    /// Timeout applied to each payment API call.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        self.secret_key()?;
        ensure_non_empty(&self.api_url, "API_URL")?;
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("API_URL must start with http:// or https://");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
