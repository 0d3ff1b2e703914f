//! Configuration settings
//!
//! Typed settings loaded from a TOML file and environment variables. A client
//! captures these once at construction; nothing here is process-global.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default remote origin
pub const DEFAULT_BASE_URL: &str = "https://api.voltar.lol";

// Helper functions for serde defaults
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("voltar-client/{}", crate::utils::VERSION)
}

fn default_interval_ms() -> u64 {
    crate::client::DEFAULT_POLLING_INTERVAL.as_millis() as u64
}

fn default_timeout_ms() -> u64 {
    crate::client::DEFAULT_TASK_TIMEOUT.as_millis() as u64
}

fn default_log_level() -> String {
    "error".to_string()
}

/// Main configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiSettings,
    /// Task polling configuration
    #[serde(default)]
    pub polling: PollingSettings,
    /// Network configuration
    #[serde(default)]
    pub network: NetworkSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Remote API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every request path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Task polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Delay between status checks in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Polling budget in milliseconds, measured from task creation
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Network and proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// HTTPS proxy URL
    #[serde(default)]
    pub https_proxy: Option<String>,
    /// HTTP proxy URL
    #[serde(default)]
    pub http_proxy: Option<String>,
    /// All protocols proxy URL
    #[serde(default)]
    pub all_proxy: Option<String>,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            https_proxy: None,
            http_proxy: None,
            all_proxy: None,
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
        }
    }
}

impl PollingSettings {
    /// Polling interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Task timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::config(name, &format!("Invalid value '{}': {}", value, e)))
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in defaults with environment overrides applied
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Load settings from configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config("file", &format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            crate::Error::config("file", &format!("Failed to parse config file: {}", e))
        })?;

        Ok(settings)
    }

    /// Overlay every environment variable that is set
    ///
    /// A set variable always wins over the current value, even when it
    /// happens to equal the built-in default.
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Some(api_key) = env_value("VOLTAR_API_KEY") {
            self.api.api_key = Some(api_key);
        }
        if let Some(base_url) = env_value("VOLTAR_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(interval) = env_value("VOLTAR_POLL_INTERVAL_MS") {
            self.polling.interval_ms = parse_env("VOLTAR_POLL_INTERVAL_MS", &interval)?;
        }
        if let Some(timeout) = env_value("VOLTAR_TIMEOUT_MS") {
            self.polling.timeout_ms = parse_env("VOLTAR_TIMEOUT_MS", &timeout)?;
        }
        if let Some(level) = env_value("LOG_LEVEL") {
            self.logging.level = level;
        }

        for (name, slot) in [
            ("HTTPS_PROXY", &mut self.network.https_proxy),
            ("HTTP_PROXY", &mut self.network.http_proxy),
            ("ALL_PROXY", &mut self.network.all_proxy),
        ] {
            if let Some(proxy) = env_value(name) {
                *slot = Some(proxy);
            }
        }

        Ok(())
    }

    /// Get effective proxy URL based on priority (HTTPS, then HTTP, then ALL)
    pub fn get_proxy_url(&self) -> Option<String> {
        self.network
            .https_proxy
            .as_ref()
            .or(self.network.http_proxy.as_ref())
            .or(self.network.all_proxy.as_ref())
            .cloned()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(crate::Error::config(
                "base_url",
                &format!("Invalid base URL '{}': {}", self.api.base_url, e),
            ));
        }

        if self.polling.interval_ms == 0 {
            return Err(crate::Error::config(
                "interval_ms",
                "Invalid polling interval: cannot be 0",
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(
                    "log_level",
                    &format!("Invalid log level: {}", self.logging.level),
                ));
            }
        }

        for (name, proxy_url) in [
            ("https_proxy", &self.network.https_proxy),
            ("http_proxy", &self.network.http_proxy),
            ("all_proxy", &self.network.all_proxy),
        ]
        .iter()
        {
            if let Some(url_str) = proxy_url
                && let Err(e) = url::Url::parse(url_str)
            {
                return Err(crate::Error::config(
                    *name,
                    &format!("Invalid proxy URL '{}': {}", url_str, e),
                ));
            }
        }

        Ok(())
    }
}
