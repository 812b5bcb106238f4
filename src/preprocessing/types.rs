//! # Shared Types for Image Preprocessing
//!
//! Result structs, operation enums and the error type shared by the
//! preprocessing sub-modules.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// A pipeline parameter is out of range
    InvalidParameter { message: String },
    /// Image processing operation failed
    ProcessingFailed { message: String },
    /// Failed to load or decode image
    ImageLoad { message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::InvalidParameter { message } => {
                write!(f, "Invalid preprocessing parameter: {}", message)
            }
            PreprocessingError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
            PreprocessingError::ImageLoad { message } => {
                write!(f, "Failed to load image: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Result of adaptive thresholding.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// The thresholded binary image
    pub image: GrayImage,
    /// Side of the square neighbourhood used for the local mean
    pub block_size: u32,
    /// Constant subtracted from the local mean
    pub constant: i32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of morphological operations on binary images.
#[derive(Debug, Clone)]
pub struct MorphologicalImageResult {
    /// The morphologically processed image
    pub image: GrayImage,
    /// Type of morphological operation applied
    pub operation: MorphologicalOperation,
    /// Kernel size used (e.g., 3 for 3x3 kernel)
    pub kernel_size: u32,
    /// Number of times the operation was applied
    pub iterations: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Types of morphological operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MorphologicalOperation {
    /// Erosion operation (shrinks bright regions)
    Erosion,
    /// Dilation operation (expands bright regions)
    Dilation,
    /// Opening operation (erosion followed by dilation - removes noise)
    Opening,
    /// Closing operation (dilation followed by erosion - fills gaps)
    Closing,
}

/// Fixed parameters of the OCR preprocessing pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    pub block_size: u32,
    pub constant: i32,
    pub kernel_size: u32,
    pub iterations: u32,
}

impl PipelineParams {
    /// The only parameter set the pipeline runs with.
    pub const FIXED: PipelineParams = PipelineParams {
        block_size: 11,
        constant: 2,
        kernel_size: 1,
        iterations: 1,
    };
}

/// Output of the full preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessedImageResult {
    /// Binary image ready for OCR
    pub image: GrayImage,
    /// Original image dimensions (width, height)
    pub original_dimensions: (u32, u32),
    /// Parameters the pipeline ran with
    pub params: PipelineParams,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}
