//! # Image Thresholding Module
//!
//! Local-mean adaptive thresholding. Each pixel is compared against the mean
//! of its `block_size × block_size` neighbourhood minus a constant, with image
//! borders replicated outward.

use image::{GrayImage, Luma};
use tracing;

use super::types::{PreprocessingError, ThresholdedImageResult};

/// Applies adaptive mean thresholding to a grayscale image.
///
/// A pixel becomes white (255) when its intensity is strictly greater than
/// `mean(neighbourhood) - constant`, black (0) otherwise. The neighbourhood
/// mean is rounded to the nearest integer.
///
/// # Arguments
///
/// * `image` - The grayscale input image
/// * `block_size` - Odd neighbourhood side length, at least 3
/// * `constant` - Value subtracted from the local mean
///
/// # Examples
///
/// ```no_run
/// use id_scanner::preprocessing::apply_adaptive_threshold;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gray = image::open("id_card.jpg")?.to_luma8();
/// let thresholded = apply_adaptive_threshold(&gray, 11, 2)?;
/// // thresholded.image only contains 0 and 255
/// # Ok(())
/// # }
/// ```
pub fn apply_adaptive_threshold(
    image: &GrayImage,
    block_size: u32,
    constant: i32,
) -> Result<ThresholdedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if block_size < 3 || block_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("block size must be odd and >= 3, got {}", block_size),
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessingError::ProcessingFailed {
            message: "cannot threshold an empty image".to_string(),
        });
    }

    let means = local_means(image, block_size);

    let mut binary_img = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let mean = means[(y * width + x) as usize] as i32;
        let value = if (pixel[0] as i32) > mean - constant {
            255u8
        } else {
            0u8
        };
        binary_img.put_pixel(x, y, Luma([value]));
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Adaptive threshold completed in {}ms: block_size={}, constant={}, dimensions={}x{}",
        processing_time.as_millis(),
        block_size,
        constant,
        width,
        height
    );

    Ok(ThresholdedImageResult {
        image: binary_img,
        block_size,
        constant,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Rounded box-filter means with replicated borders, computed as two
/// separable passes.
fn local_means(image: &GrayImage, block_size: u32) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let radius = (block_size / 2) as i64;
    let (w, h) = (width as i64, height as i64);

    // Horizontal pass: row sums over the block width
    let mut row_sums = vec![0u32; (width * height) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            for k in -radius..=radius {
                let sx = (x + k).clamp(0, w - 1);
                sum += image.get_pixel(sx as u32, y as u32)[0] as u32;
            }
            row_sums[(y * w + x) as usize] = sum;
        }
    }

    // Vertical pass over the row sums
    let area = block_size * block_size;
    let mut means = vec![0u8; (width * height) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            for k in -radius..=radius {
                let sy = (y + k).clamp(0, h - 1);
                sum += row_sums[(sy * w + x) as usize];
            }
            means[(y * w + x) as usize] = ((sum + area / 2) / area) as u8;
        }
    }

    means
}
