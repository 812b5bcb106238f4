//! # Image Filtering Module
//!
//! Morphological operations for cleaning thresholded binary images before OCR.
//! Erosion and dilation use a square structuring element of side `kernel_size`.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use tracing;

use super::types::{MorphologicalImageResult, MorphologicalOperation, PreprocessingError};

/// Applies a morphological operation to a binary image.
///
/// Supports erosion, dilation, opening (erosion then dilation) and closing
/// (dilation then erosion). The whole operation is repeated `iterations`
/// times. A `kernel_size` of 1 leaves the image unchanged.
///
/// # Arguments
///
/// * `image` - The input binary image to process
/// * `operation` - The morphological operation to apply
/// * `kernel_size` - Odd side length of the square kernel
/// * `iterations` - How many times to apply the operation (at least 1)
///
/// # Examples
///
/// ```no_run
/// use id_scanner::preprocessing::{apply_morphological_operation, MorphologicalOperation};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let binary = image::open("binary_card.png")?.to_luma8();
/// let cleaned = apply_morphological_operation(&binary, MorphologicalOperation::Opening, 3, 1)?;
/// # Ok(())
/// # }
/// ```
pub fn apply_morphological_operation(
    image: &GrayImage,
    operation: MorphologicalOperation,
    kernel_size: u32,
    iterations: u32,
) -> Result<MorphologicalImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let radius = kernel_radius(kernel_size)?;
    if iterations == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: "iterations must be at least 1".to_string(),
        });
    }

    let mut processed = image.clone();
    for _ in 0..iterations {
        processed = match operation {
            MorphologicalOperation::Erosion => erode(&processed, Norm::LInf, radius),
            MorphologicalOperation::Dilation => dilate(&processed, Norm::LInf, radius),
            MorphologicalOperation::Opening => {
                let eroded = erode(&processed, Norm::LInf, radius);
                dilate(&eroded, Norm::LInf, radius)
            }
            MorphologicalOperation::Closing => {
                let dilated = dilate(&processed, Norm::LInf, radius);
                erode(&dilated, Norm::LInf, radius)
            }
        };
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Morphological operation completed in {}ms: operation={:?}, kernel={}x{}, iterations={}, dimensions={}x{}",
        processing_time.as_millis(),
        operation,
        kernel_size,
        kernel_size,
        iterations,
        processed.width(),
        processed.height()
    );

    Ok(MorphologicalImageResult {
        image: processed,
        operation,
        kernel_size,
        iterations,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Chebyshev radius of a square kernel: a 3x3 kernel has radius 1.
fn kernel_radius(kernel_size: u32) -> Result<u8, PreprocessingError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("kernel size must be odd and >= 1, got {}", kernel_size),
        });
    }
    u8::try_from((kernel_size - 1) / 2).map_err(|_| PreprocessingError::InvalidParameter {
        message: format!("kernel size {} is too large", kernel_size),
    })
}
