//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! all application settings into a single, structured configuration object.
//! It supports loading from environment variables, validation, and provides
//! a clean interface for accessing configuration throughout the application.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::ocr_config::{ModelType, OcrConfig};
use crate::session::{ApiConfig, DEFAULT_HEADERS_JSON};
use serde::{Deserialize, Serialize};
use std::env;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds (Telegram API and file downloads)
    pub http_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        let Some((bot_id, secret)) = self.token.split_once(':') else {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        };

        if secret.contains(':') {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if bot_id.parse::<u64>().is_err() {
            return Err(AppError::Config(
                "Bot token bot ID must be numeric".to_string(),
            ));
        }

        if secret.len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// API settings every new session starts with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDefaults {
    /// Submission endpoint; sessions start unconfigured when empty
    pub endpoint_url: String,
    pub api_key: Option<String>,
    pub headers_json: Option<String>,
}

impl ApiDefaults {
    /// Validate API defaults.
    ///
    /// Header JSON is not checked here: a malformed value falls back to the
    /// default headers at submission time, like a user-typed one.
    pub fn validate(&self) -> AppResult<()> {
        let url = self.endpoint_url.trim();
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "DEFAULT_API_URL must start with 'http://' or 'https://', got '{}'",
                url
            )));
        }
        Ok(())
    }

    pub fn to_api_config(&self) -> ApiConfig {
        ApiConfig {
            endpoint_url: self.endpoint_url.trim().to_string(),
            api_key: self.api_key.clone().filter(|key| !key.trim().is_empty()),
            headers_json: self
                .headers_json
                .clone()
                .filter(|json| !json.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HEADERS_JSON.to_string()),
        }
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// OCR processing configuration
    pub ocr: OcrConfig,
    /// Defaults for per-session API settings
    pub api: ApiDefaults,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Load bot configuration
        config.bot.token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        config.bot.http_timeout_secs = env::var("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AppError::Config("HTTP_CLIENT_TIMEOUT_SECS must be a valid number".to_string())
            })?;

        // Load OCR configuration
        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.ocr.languages = languages.trim().to_string();
        }
        if let Ok(model) = env::var("OCR_MODEL") {
            config.ocr.model_type = model.parse::<ModelType>()?;
        }

        // Load API defaults
        config.api.endpoint_url = env::var("DEFAULT_API_URL").unwrap_or_default();
        config.api.api_key = env::var("DEFAULT_API_KEY").ok();
        config.api.headers_json = env::var("DEFAULT_API_HEADERS").ok();

        config.observability = ObservabilityConfig::from_env()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.ocr.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], ocr_languages={}, ocr_model={:?}, default_api_url={}, default_api_key={}, metrics_port={}, observability_enabled={}",
            self.ocr.languages,
            self.ocr.model_type,
            if self.api.endpoint_url.is_empty() { "<unset>" } else { &self.api.endpoint_url },
            if self.api.api_key.is_some() { "[REDACTED]" } else { "<unset>" },
            self.observability.metrics_port,
            self.observability.enable_metrics_export
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOKEN: &str = "123456789:ABCdefGHIjklMNOpqrsTUVwxyz";

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        // Empty token makes the default invalid
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bot_config_validation() {
        let mut config = BotConfig::default();

        // Invalid: empty token
        assert!(config.validate().is_err());

        // Invalid: malformed token
        config.token = "no-colon-here".to_string();
        assert!(config.validate().is_err());

        // Invalid: non-numeric bot id
        config.token = "abc:ABCdefGHIjklMNOpqrsTUVwxyz".to_string();
        assert!(config.validate().is_err());

        // Invalid: too short
        config.token = "123:short".to_string();
        assert!(config.validate().is_err());

        config.token = VALID_TOKEN.to_string();
        assert!(config.validate().is_ok());

        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.http_timeout_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_defaults_to_api_config() {
        let defaults = ApiDefaults::default();
        let api = defaults.to_api_config();
        assert!(!api.is_configured());
        assert_eq!(api.api_key, None);
        assert_eq!(api.headers_json, DEFAULT_HEADERS_JSON);

        let defaults = ApiDefaults {
            endpoint_url: " https://api.example.com/ids ".to_string(),
            api_key: Some("   ".to_string()),
            headers_json: Some(r#"{"X-Source": "bot"}"#.to_string()),
        };
        let api = defaults.to_api_config();
        assert_eq!(api.endpoint_url, "https://api.example.com/ids");
        assert_eq!(api.api_key, None);
        assert_eq!(api.headers_json, r#"{"X-Source": "bot"}"#);
    }

    #[test]
    fn test_api_defaults_validation() {
        let mut defaults = ApiDefaults::default();
        assert!(defaults.validate().is_ok());

        defaults.endpoint_url = "ftp://example.com".to_string();
        assert!(defaults.validate().is_err());

        defaults.endpoint_url = "http://localhost:8000/submit".to_string();
        defaults.headers_json = Some("not json".to_string());
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_summary_redacts_secrets() {
        let config = AppConfig {
            bot: BotConfig {
                token: VALID_TOKEN.to_string(),
                ..Default::default()
            },
            api: ApiDefaults {
                api_key: Some("secret-key".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let summary = config.summary();
        assert!(!summary.contains(VALID_TOKEN));
        assert!(!summary.contains("secret-key"));
        assert!(summary.contains("ocr_languages=eng"));
    }
}
