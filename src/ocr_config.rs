//! # OCR Configuration Module
//!
//! Tesseract settings and image acceptance limits for document scans.

use crate::errors::{AppError, AppResult};

pub const DEFAULT_LANGUAGES: &str = "eng";
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB limit for image files

/// Format-specific file size limits
#[derive(Debug, Clone)]
pub struct FormatSizeLimits {
    /// PNG format limit
    pub png_max: u64,
    /// JPEG format limit (phone photos)
    pub jpeg_max: u64,
    /// BMP format limit (uncompressed)
    pub bmp_max: u64,
}

impl Default for FormatSizeLimits {
    fn default() -> Self {
        Self {
            png_max: 10 * 1024 * 1024,
            jpeg_max: 10 * 1024 * 1024,
            bmp_max: 5 * 1024 * 1024,
        }
    }
}

impl FormatSizeLimits {
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("png_max", self.png_max),
            ("jpeg_max", self.jpeg_max),
            ("bmp_max", self.bmp_max),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be greater than 0", name)));
            }
        }
        Ok(())
    }

    /// Limit for a detected format, `None` when the format is not accepted
    pub fn limit_for(&self, format: image::ImageFormat) -> Option<u64> {
        match format {
            image::ImageFormat::Png => Some(self.png_max),
            image::ImageFormat::Jpeg => Some(self.jpeg_max),
            image::ImageFormat::Bmp => Some(self.bmp_max),
            _ => None,
        }
    }
}

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    #[default]
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
    /// Find as much text as possible in no particular order
    SparseText = 11,
}

impl PageSegMode {
    /// Value passed to Tesseract's `tessedit_pageseg_mode`
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SparseText => "11",
        }
    }
}

/// Tesseract model type for different accuracy/speed trade-offs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ModelType {
    /// Fast model (tessdata_fast)
    #[default]
    Fast,
    /// Best model (tessdata_best)
    Best,
}

impl ModelType {
    /// Get the tessdata directory name for this model type
    pub fn tessdata_dir(&self) -> &'static str {
        match self {
            ModelType::Fast => "tessdata_fast",
            ModelType::Best => "tessdata_best",
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ModelType::Fast),
            "best" => Ok(ModelType::Best),
            other => Err(AppError::Config(format!(
                "unknown OCR model '{}', expected 'fast' or 'best'",
                other
            ))),
        }
    }
}

/// Configuration structure for OCR processing
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR language codes (e.g., "eng", "eng+fra")
    pub languages: String,
    /// Tesseract model type
    pub model_type: ModelType,
    /// Buffer size for format detection in bytes
    pub buffer_size: usize,
    /// Minimum bytes required for format detection
    pub min_format_bytes: usize,
    /// Maximum allowed file size in bytes (general limit)
    pub max_file_size: u64,
    /// Format-specific size limits
    pub format_limits: FormatSizeLimits,
    /// Page segmentation mode
    pub psm_mode: PageSegMode,
    /// Optional character whitelist
    pub character_whitelist: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            model_type: ModelType::default(),
            buffer_size: FORMAT_DETECTION_BUFFER_SIZE,
            min_format_bytes: MIN_FORMAT_BYTES,
            max_file_size: MAX_FILE_SIZE,
            format_limits: FormatSizeLimits::default(),
            psm_mode: PageSegMode::default(),
            character_whitelist: None,
        }
    }
}

impl OcrConfig {
    /// Key used to cache Tesseract instances. Covers every setting applied
    /// when the engine is created.
    pub fn instance_key(&self) -> String {
        format!(
            "{}:{:?}:psm{}:{}",
            self.languages,
            self.model_type,
            self.psm_mode.as_str(),
            self.character_whitelist.as_deref().unwrap_or("")
        )
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }
        if self
            .languages
            .split('+')
            .any(|lang| lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(AppError::Config(format!(
                "invalid OCR language list '{}'",
                self.languages
            )));
        }

        if self.buffer_size == 0 {
            return Err(AppError::Config(
                "buffer_size must be greater than 0".to_string(),
            ));
        }
        if self.min_format_bytes == 0 {
            return Err(AppError::Config(
                "min_format_bytes must be greater than 0".to_string(),
            ));
        }
        if self.min_format_bytes > self.buffer_size {
            return Err(AppError::Config(format!(
                "min_format_bytes ({}) cannot exceed buffer_size ({})",
                self.min_format_bytes, self.buffer_size
            )));
        }

        if self.max_file_size == 0 {
            return Err(AppError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }

        if let Some(whitelist) = &self.character_whitelist {
            if whitelist.is_empty() {
                return Err(AppError::Config(
                    "character_whitelist cannot be empty when set".to_string(),
                ));
            }
        }

        self.format_limits.validate()?;

        Ok(())
    }
}
