//! # Observability Configuration
//!
//! Environment-driven settings for logging, metrics and trace export.

use std::env;

use crate::errors::{AppError, AppResult};

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// OTLP endpoint for trace export; tracing export is off when unset
    pub otlp_endpoint: Option<String>,
    /// Port of the metrics/health HTTP server
    pub metrics_port: u16,
    /// Listen on all interfaces instead of localhost only
    pub bind_all_interfaces: bool,
    /// Bearer token required on the metrics server, if set
    pub metrics_auth_token: Option<String>,
    /// Log level for this crate
    pub log_level: String,
    /// Force `pretty` or `json` log output regardless of environment
    pub log_format: Option<String>,
    /// Whether to sample traces
    pub enable_trace_sampling: bool,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Whether to start the Prometheus exporter and HTTP server
    pub enable_metrics_export: bool,
    /// Extra resource attributes attached to exported traces
    pub tags: Vec<(String, String)>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            otlp_endpoint: None,
            metrics_port: 9090,
            bind_all_interfaces: false,
            metrics_auth_token: None,
            log_level: "info".to_string(),
            log_format: None,
            enable_trace_sampling: false,
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
            tags: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.trim().is_empty()),
            metrics_port: parse_env("METRICS_PORT", defaults.metrics_port)?,
            bind_all_interfaces: parse_env("METRICS_BIND_ALL_INTERFACES", false)?,
            metrics_auth_token: env::var("METRICS_AUTH_TOKEN").ok().filter(|s| !s.is_empty()),
            log_level: env::var("OBSERVABILITY_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: env::var("LOG_FORMAT").ok(),
            enable_trace_sampling: parse_env("ENABLE_TRACE_SAMPLING", false)?,
            trace_sampling_ratio: parse_env("TRACE_SAMPLING_RATIO", 1.0)?,
            enable_metrics_export: parse_env("ENABLE_METRICS_EXPORT", true)?,
            tags: env::var("OBSERVABILITY_TAGS")
                .map(|tags| parse_tags(&tags))
                .unwrap_or_default(),
        })
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Pretty logs in development or when `LOG_FORMAT=pretty`, JSON otherwise
    pub fn use_pretty_logs(&self) -> bool {
        match self.log_format.as_deref() {
            Some("pretty") => true,
            Some("json") => false,
            _ => self.is_development(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "Invalid OTLP endpoint format: {}",
                    endpoint
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(AppError::Config(format!(
                "Invalid trace sampling ratio: {}",
                self.trace_sampling_ratio
            )));
        }

        if self.metrics_port == 0 {
            return Err(AppError::Config(format!(
                "Invalid metrics port: {}",
                self.metrics_port
            )));
        }

        if let Some(format) = &self.log_format {
            if format != "pretty" && format != "json" {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    format
                )));
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Parse tags from an environment variable string.
/// Format: "key1=value1,key2=value2"
fn parse_tags(tags_str: &str) -> Vec<(String, String)> {
    tags_str
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}
