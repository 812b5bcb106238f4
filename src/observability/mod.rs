//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging (pretty or JSON)
//! - Optional OpenTelemetry trace export
//! - Prometheus metrics and health endpoints

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;

use crate::observability_config::ObservabilityConfig;
use crate::ocr_config::OcrConfig;

pub use health_checks::{check_ocr_health, perform_readiness_checks, start_health_metrics_recorder};
pub use metrics::{
    record_api_metrics, record_extraction_metrics, record_health_check_metrics,
    record_ocr_metrics, record_startup_metrics, record_telegram_message,
};
pub use tracing_mod::{api_span, ocr_span, telegram_span};

/// Initialize the complete observability stack.
///
/// Logging and OTLP span export (when an endpoint is set) first, then the
/// Prometheus recorder and health server (when metrics export is enabled).
pub async fn init_observability_with_config(
    config: &ObservabilityConfig,
    ocr_config: &OcrConfig,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    tracing_mod::init_tracing_with_config(config)?;

    if config.enable_metrics_export {
        let metrics_handle = metrics::init_metrics_with_config(config)?;
        metrics::start_metrics_server(metrics_handle, config, ocr_config.clone()).await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
