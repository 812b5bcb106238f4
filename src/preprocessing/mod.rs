//! # Image Preprocessing Module
//!
//! Prepares identity-document photos for OCR.
//!
//! The module is organized into focused sub-modules:
//! - `thresholding`: local-mean adaptive thresholding
//! - `filtering`: morphological operations on binary images
//! - `pipeline`: decoding, the fixed OCR preparation chain and PNG encoding
//! - `types`: shared types and error definitions

pub mod filtering;
pub mod pipeline;
pub mod thresholding;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use types::{
    MorphologicalImageResult, MorphologicalOperation, PipelineParams, PreprocessedImageResult,
    PreprocessingError, ThresholdedImageResult,
};

pub use filtering::apply_morphological_operation;
pub use pipeline::{decode_image, encode_png, preprocess_for_ocr};
pub use thresholding::apply_adaptive_threshold;
