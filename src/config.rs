//! Application configuration loaded from environment variables.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind the HTTP server to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    // === Upstream (fabdl) ===
    /// Base URL of the conversion service. Also prefixes returned download paths.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Timeout applied to each outbound call, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// TCP connect timeout for outbound calls, in milliseconds.
    #[serde(default = "default_upstream_connect_timeout_ms")]
    pub upstream_connect_timeout_ms: u64,

    /// User-Agent sent to the upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // === Observability ===
    /// Install the Prometheus recorder and expose `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_addr() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_upstream_base_url() -> String {
    "https://api.fabdl.com".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_upstream_connect_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    concat!("spotify-dl-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_addr: default_bind_addr(),
            upstream_base_url: default_upstream_base_url(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            upstream_connect_timeout_ms: default_upstream_connect_timeout_ms(),
            user_agent: default_user_agent(),
            metrics_enabled: true,
            rust_log: default_log_level(),
            log_format: default_log_format(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let base = Url::parse(&self.upstream_base_url)
            .map_err(|e| format!("UPSTREAM_BASE_URL is not a valid URL: {}", e))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err("UPSTREAM_BASE_URL must use http or https".to_string());
        }

        if base.query().is_some() || base.fragment().is_some() {
            return Err("UPSTREAM_BASE_URL must not carry a query or fragment".to_string());
        }

        if self.upstream_timeout_ms == 0 {
            return Err("UPSTREAM_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.upstream_connect_timeout_ms == 0 {
            return Err("UPSTREAM_CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.upstream_connect_timeout_ms > self.upstream_timeout_ms {
            return Err(
                "UPSTREAM_CONNECT_TIMEOUT_MS must not exceed UPSTREAM_TIMEOUT_MS".to_string(),
            );
        }

        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err("LOG_FORMAT must be \"pretty\" or \"json\"".to_string());
        }

        Ok(())
    }

    /// Per-call upstream timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Upstream connect timeout.
    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_connect_timeout_ms)
    }

    /// Check if JSON log output was requested.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
