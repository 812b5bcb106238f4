//! Health check functionality module.
//!
//! Readiness means the OCR engine can be started with the configured
//! languages and model; liveness only needs the process to answer.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::instance_manager::create_engine;
use crate::ocr_config::OcrConfig;

/// Perform readiness checks
pub async fn perform_readiness_checks(ocr_config: &OcrConfig) -> Result<()> {
    check_ocr_health(ocr_config).await
}

/// Check OCR engine availability by building a throwaway engine exactly as
/// scans do, same tessdata directory and variables included
pub async fn check_ocr_health(ocr_config: &OcrConfig) -> Result<()> {
    let config = ocr_config.clone();
    tokio::task::spawn_blocking(move || match create_engine(&config) {
        Ok(_) => {
            tracing::debug!("OCR health check passed");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("OCR health check failed: {}", e)),
    })
    .await?
}

/// Start a background task that records the OCR health every minute
pub fn start_health_metrics_recorder(ocr_config: OcrConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            let check_start = Instant::now();
            let ocr_healthy = check_ocr_health(&ocr_config).await.is_ok();
            super::metrics::record_health_check_metrics("ocr", ocr_healthy, check_start.elapsed());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_builds_the_scan_engine() {
        let config = OcrConfig {
            languages: "zzz_not_a_language".to_string(),
            model_type: crate::ocr_config::ModelType::Best,
            ..Default::default()
        };

        let err = perform_readiness_checks(&config).await.unwrap_err();
        // Same failure a scan would report for this configuration
        assert!(err.to_string().contains("Failed to initialize Tesseract for 'zzz_not_a_language'"));
    }
}
