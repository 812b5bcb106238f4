//! # Preprocessing Pipeline
//!
//! Decodes uploaded image bytes and runs the fixed OCR preparation chain:
//! grayscale, adaptive threshold, opening, dilation.

use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;
use tracing;

use super::filtering::apply_morphological_operation;
use super::thresholding::apply_adaptive_threshold;
use super::types::{
    MorphologicalOperation, PipelineParams, PreprocessedImageResult, PreprocessingError,
};

/// Decodes raw image bytes (JPEG, PNG, BMP, ...) into an image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PreprocessingError> {
    if bytes.is_empty() {
        return Err(PreprocessingError::ImageLoad {
            message: "image data is empty".to_string(),
        });
    }

    image::load_from_memory(bytes).map_err(|e| PreprocessingError::ImageLoad {
        message: e.to_string(),
    })
}

/// Prepares an image for OCR with [`PipelineParams::FIXED`].
///
/// The parameters are not tuned per image; every upload goes through the
/// same four steps.
///
/// # Examples
///
/// ```no_run
/// use id_scanner::preprocessing::{decode_image, preprocess_for_ocr};
///
/// # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
/// let image = decode_image(bytes)?;
/// let prepared = preprocess_for_ocr(&image)?;
/// assert_eq!(prepared.image.dimensions(), (image.width(), image.height()));
/// # Ok(())
/// # }
/// ```
pub fn preprocess_for_ocr(
    image: &DynamicImage,
) -> Result<PreprocessedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();
    let params = PipelineParams::FIXED;
    let original_dimensions = (image.width(), image.height());

    let gray = image.to_luma8();
    let thresholded = apply_adaptive_threshold(&gray, params.block_size, params.constant)?;
    let opened = apply_morphological_operation(
        &thresholded.image,
        MorphologicalOperation::Opening,
        params.kernel_size,
        params.iterations,
    )?;
    let dilated = apply_morphological_operation(
        &opened.image,
        MorphologicalOperation::Dilation,
        params.kernel_size,
        params.iterations,
    )?;

    let processing_time = start_time.elapsed();

    tracing::info!(
        target: "ocr_preprocessing",
        width = original_dimensions.0,
        height = original_dimensions.1,
        duration_ms = processing_time.as_millis() as u64,
        "Image preprocessed for OCR"
    );

    Ok(PreprocessedImageResult {
        image: dilated.image,
        original_dimensions,
        params,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Encodes a grayscale image as PNG bytes.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, PreprocessingError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PreprocessingError::ProcessingFailed {
            message: format!("PNG encoding failed: {}", e),
        })?;
    Ok(buffer.into_inner())
}
