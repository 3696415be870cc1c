//! Configuration data structures for the redirect service.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files.
//! Every section has defaults so a config file only needs to name what it
//! changes; an empty file yields a service redirecting godoc.org to
//! pkg.go.dev on `127.0.0.1:8080`.
use serde::{Deserialize, Serialize};

use crate::core::{
    mapper::{DEFAULT_ATTRIBUTION_SOURCE, PKG_GO_DEV_HOST},
    redirect::{BACK_TO_GODOC, GODOC_HOST},
    toggle::REDIRECT_COOKIE,
};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Redirect decision settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    /// Host the service answers for; used when a request carries no host
    pub legacy_host: String,
    /// Host redirected clients are sent to
    pub successor_host: String,
    /// Value of the `utm_source` parameter appended to every redirect
    pub attribution_source: String,
    /// Cookie remembering a client's opt-in
    pub cookie_name: String,
    /// `utm_source` value marking clients coming back from the successor site
    pub return_marker: String,
    /// Host prefixes that are always served locally (e.g. "api.")
    pub exempt_host_prefixes: Vec<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            legacy_host: GODOC_HOST.to_string(),
            successor_host: PKG_GO_DEV_HOST.to_string(),
            attribution_source: DEFAULT_ATTRIBUTION_SOURCE.to_string(),
            cookie_name: REDIRECT_COOKIE.to_string(),
            return_marker: BACK_TO_GODOC.to_string(),
            exempt_host_prefixes: vec!["api.".to_string()],
        }
    }
}

fn default_fallback_body() -> String {
    "godoc.org is served locally. Add ?redirect=on to any URL to use pkg.go.dev instead.\n"
        .to_string()
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// What answers requests that are not redirected.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum FallbackConfig {
    /// Fixed response body
    Static {
        #[serde(default = "default_fallback_body")]
        body: String,
        #[serde(default = "default_content_type")]
        content_type: String,
    },
    /// Forward to the legacy origin
    Proxy {
        target: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig::Static {
            body: default_fallback_body(),
            content_type: default_content_type(),
        }
    }
}

fn default_buffer_size() -> usize {
    1024
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval_ms() -> u64 {
    1000
}

/// Where telemetry events go.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "sink")]
#[serde(rename_all = "snake_case")]
pub enum TelemetryConfig {
    /// Drop every event
    Disabled,
    /// Structured log record per event
    #[default]
    Log,
    /// Batched JSON POSTs to an event collector
    Http {
        endpoint: String,
        #[serde(default = "default_buffer_size")]
        buffer_size: usize,
        #[serde(default = "default_batch_size")]
        batch_size: usize,
        #[serde(default = "default_flush_interval_ms")]
        flush_interval_ms: u64,
    },
}

/// Log output settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            redirect: RedirectConfig::default(),
            fallback: FallbackConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Builder for ServerConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ServerConfigBuilder {
    listen_addr: Option<String>,
    redirect: Option<RedirectConfig>,
    fallback: Option<FallbackConfig>,
    telemetry: Option<TelemetryConfig>,
    logging: Option<LoggingConfig>,
}

impl ServerConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the redirect settings
    pub fn redirect(mut self, config: RedirectConfig) -> Self {
        self.redirect = Some(config);
        self
    }

    /// Forward non-redirected requests to `target`
    pub fn proxy_fallback(mut self, target: impl Into<String>) -> Self {
        self.fallback = Some(FallbackConfig::Proxy {
            target: target.into(),
            timeout_secs: default_timeout_secs(),
        });
        self
    }

    /// Answer non-redirected requests with a fixed body
    pub fn static_fallback(mut self, body: impl Into<String>) -> Self {
        self.fallback = Some(FallbackConfig::Static {
            body: body.into(),
            content_type: default_content_type(),
        });
        self
    }

    /// Set the telemetry sink
    pub fn telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry = Some(config);
        self
    }

    /// Set log output
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Build the final ServerConfig
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            redirect: self.redirect.unwrap_or_default(),
            fallback: self.fallback.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}
