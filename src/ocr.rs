//! # OCR Processing Module
//!
//! Text extraction from preprocessed document images using the Tesseract OCR
//! engine.
//!
//! ## Supported Upload Formats
//!
//! - PNG
//! - JPEG/JPG
//! - BMP
//!
//! The engine always receives the binary image produced by
//! [`crate::preprocessing::preprocess_for_ocr`], written to a temporary PNG.

use image::{GrayImage, ImageFormat};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn, Instrument};

use crate::errors::error_logging;
use crate::observability;

pub use crate::instance_manager::OcrInstanceManager;
pub use crate::ocr_config::OcrConfig;
pub use crate::ocr_errors::OcrError;

/// Validate uploaded image bytes and detect their format.
///
/// Rejects empty uploads, uploads over the general size limit, data whose
/// format cannot be recognized from its header, formats other than JPEG, PNG
/// and BMP, and uploads above their format-specific limit.
///
/// # Examples
///
/// ```rust
/// use id_scanner::ocr::{validate_image_bytes, OcrConfig};
///
/// let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
/// let format = validate_image_bytes(&png_header, &OcrConfig::default()).unwrap();
/// assert_eq!(format, image::ImageFormat::Png);
/// ```
pub fn validate_image_bytes(bytes: &[u8], config: &OcrConfig) -> Result<ImageFormat, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::Validation("image data is empty".to_string()));
    }

    let size = bytes.len() as u64;
    if size > config.max_file_size {
        return Err(OcrError::Validation(format!(
            "Image too large: {} bytes (maximum allowed: {} bytes)",
            size, config.max_file_size
        )));
    }

    if bytes.len() < config.min_format_bytes {
        return Err(OcrError::Validation(format!(
            "Not enough data to detect image format: {} bytes",
            bytes.len()
        )));
    }

    let header = &bytes[..bytes.len().min(config.buffer_size)];
    let format = image::guess_format(header)
        .map_err(|_| OcrError::Validation("Unrecognized image format".to_string()))?;

    let limit = config.format_limits.limit_for(format).ok_or_else(|| {
        OcrError::Validation(format!("Unsupported image format: {:?}", format))
    })?;

    if size > limit {
        return Err(OcrError::Validation(format!(
            "Image file too large for {:?} format: {} bytes (maximum allowed: {} bytes)",
            format, size, limit
        )));
    }

    debug!(format = ?format, size_bytes = size, "Image bytes validated");
    Ok(format)
}

/// Trim every line and drop the empty ones
pub fn clean_ocr_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Run Tesseract over a preprocessed image.
///
/// The image is written to a temporary PNG and recognized on a blocking
/// thread with the cached engine for `config`. The call is attempted once;
/// a failure is returned to the caller as-is.
///
/// # Errors
///
/// - [`OcrError::Initialization`] when no engine can be created
/// - [`OcrError::ImageLoad`] when the temporary image cannot be written or loaded
/// - [`OcrError::Extraction`] when recognition fails
pub async fn extract_text_from_image(
    image: &GrayImage,
    config: &OcrConfig,
    instance_manager: &OcrInstanceManager,
) -> Result<String, OcrError> {
    perform_ocr_extraction(image, config, instance_manager)
        .instrument(observability::ocr_span("extract_text_from_image"))
        .await
}

async fn perform_ocr_extraction(
    image: &GrayImage,
    config: &OcrConfig,
    instance_manager: &OcrInstanceManager,
) -> Result<String, OcrError> {
    let start_time = std::time::Instant::now();

    let png = crate::preprocessing::encode_png(image)
        .map_err(|e| OcrError::ImageLoad(e.to_string()))?;
    let image_size = png.len() as u64;

    let instance = instance_manager.get_instance(config)?;

    let result = tokio::task::spawn_blocking(move || -> Result<String, OcrError> {
        let mut temp_file = tempfile::Builder::new()
            .prefix("scan-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::ImageLoad(format!("Failed to create temporary file: {e}")))?;
        write_temp_image(&mut temp_file, &png)?;

        let mut tess = instance.lock();
        tess.set_image(temp_file.path()).map_err(|e| {
            OcrError::ImageLoad(format!("Failed to load image for OCR: {e}"))
        })?;
        tess.get_utf8_text()
            .map_err(|e| OcrError::Extraction(format!("Failed to extract text from image: {e}")))
    })
    .await
    .map_err(|e| OcrError::Extraction(format!("OCR worker failed: {e}")))?;

    let duration = start_time.elapsed();

    match result {
        Ok(raw_text) => {
            let text = clean_ocr_text(&raw_text);
            observability::record_ocr_metrics(true, duration, image_size);
            info!(
                duration_ms = duration.as_millis() as u64,
                chars_extracted = text.len(),
                "OCR extraction completed"
            );
            if text.is_empty() {
                warn!("OCR extraction returned empty text");
            }
            Ok(text)
        }
        Err(err) => {
            observability::record_ocr_metrics(false, duration, image_size);
            error_logging::log_ocr_error(
                &err,
                "extract_text_from_image",
                None,
                Some(image_size),
                Some(duration),
            );
            Err(err)
        }
    }
}

fn write_temp_image(temp_file: &mut NamedTempFile, png: &[u8]) -> Result<(), OcrError> {
    temp_file
        .as_file_mut()
        .write_all(png)
        .and_then(|_| temp_file.as_file_mut().flush())
        .map_err(|e| OcrError::ImageLoad(format!("Failed to write temporary image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 16] = [
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R',
    ];
    const JPEG_HEADER: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F', 0, 1];
    const GIF_HEADER: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00";

    #[test]
    fn test_validate_accepts_supported_formats() {
        let config = OcrConfig::default();
        assert_eq!(
            validate_image_bytes(&PNG_HEADER, &config).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            validate_image_bytes(&JPEG_HEADER, &config).unwrap(),
            ImageFormat::Jpeg
        );

        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&[0u8; 30]);
        assert_eq!(validate_image_bytes(&bmp, &config).unwrap(), ImageFormat::Bmp);
    }

    #[test]
    fn test_validate_rejects_empty_and_unknown() {
        let config = OcrConfig::default();
        assert!(matches!(
            validate_image_bytes(&[], &config),
            Err(OcrError::Validation(_))
        ));
        assert!(matches!(
            validate_image_bytes(b"hello world, not an image", &config),
            Err(OcrError::Validation(_))
        ));
        assert!(matches!(
            validate_image_bytes(&PNG_HEADER[..4], &config),
            Err(OcrError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_other_formats() {
        let config = OcrConfig::default();
        match validate_image_bytes(GIF_HEADER, &config) {
            Err(OcrError::Validation(msg)) => assert!(msg.contains("Unsupported")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_enforces_size_limits() {
        let config = OcrConfig {
            max_file_size: 64,
            ..Default::default()
        };
        let mut big = PNG_HEADER.to_vec();
        big.resize(65, 0);
        assert!(validate_image_bytes(&big, &config).is_err());

        let config = OcrConfig {
            format_limits: crate::ocr_config::FormatSizeLimits {
                png_max: 20,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut png = PNG_HEADER.to_vec();
        png.resize(21, 0);
        match validate_image_bytes(&png, &config) {
            Err(OcrError::Validation(msg)) => assert!(msg.contains("Png")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_clean_ocr_text() {
        let raw = "  First Name: John  \n\n   \nLast Name: Doe\n\t\n";
        assert_eq!(clean_ocr_text(raw), "First Name: John\nLast Name: Doe");
        assert_eq!(clean_ocr_text(" \n \n"), "");
    }
}
