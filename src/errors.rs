//! # Application Error Types
//!
//! This module defines common error types used throughout the scanner.
//! It provides structured error handling for the OCR pipeline, the in-memory
//! session and the API submission client.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (user input, image checks)
    Validation(String),
    /// OCR processing errors
    Ocr(String),
    /// Image preprocessing errors
    Preprocessing(String),
    /// Network/communication errors
    Network(String),
    /// Session state errors (unknown document, nothing selected)
    Session(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Preprocessing(msg) => write!(f, "[PREPROCESSING] {}", msg),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
            AppError::Session(msg) => write!(f, "[SESSION] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::ocr_errors::OcrError> for AppError {
    fn from(err: crate::ocr_errors::OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for AppError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        AppError::Preprocessing(err.to_string())
    }
}

impl From<crate::submission::SubmitError> for AppError {
    fn from(err: crate::submission::SubmitError) -> Self {
        match err {
            crate::submission::SubmitError::InvalidConfig(msg) => AppError::Config(msg),
            other => AppError::Network(other.to_string()),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        image_size: Option<u64>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            image_size_bytes = ?image_size,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        endpoint: Option<&str>,
        status: Option<u16>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            endpoint = ?endpoint,
            status = ?status,
            "Network operation failed"
        );
    }

    /// Log validation errors with input context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            input_type = %input_type,
            input_value = ?input_value.map(|v| if v.chars().count() > 100 {
                format!("{}...", v.chars().take(100).collect::<String>())
            } else {
                v.to_string()
            }),
            "Validation failed"
        );
    }

    /// Log internal application errors with component context
    pub fn log_internal_error(
        error: &impl std::fmt::Display,
        component: &str,
        operation: &str,
        chat_id: Option<i64>,
    ) {
        error!(
            error = %error,
            component = %component,
            operation = %operation,
            chat_id = ?chat_id,
            "Internal application error"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
