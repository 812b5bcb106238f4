//! # OCR Instance Manager Module
//!
//! Keeps initialized Tesseract engines around so each scan skips the
//! engine start-up cost.

use leptess::LepTess;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::ocr_config::{ModelType, OcrConfig};
use crate::ocr_errors::OcrError;

/// Shared handle to one Tesseract engine
pub type SharedEngine = Arc<Mutex<LepTess>>;

/// Thread-safe cache of Tesseract instances.
///
/// One engine is kept per [`OcrConfig::instance_key`] and created on first
/// use with [`create_engine`]. Callers lock the returned engine for the duration of a single
/// recognition, so concurrent scans with the same configuration run one at a
/// time on that engine.
pub struct OcrInstanceManager {
    instances: Mutex<HashMap<String, SharedEngine>>,
}

impl OcrInstanceManager {
    /// Create an empty manager; engines are built lazily by [`get_instance`](Self::get_instance).
    ///
    /// ```rust
    /// use id_scanner::instance_manager::OcrInstanceManager;
    ///
    /// let manager = OcrInstanceManager::new();
    /// assert_eq!(manager.instance_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the engine for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Initialization`] when Tesseract cannot load the
    /// requested languages or rejects a configuration variable.
    pub fn get_instance(&self, config: &OcrConfig) -> Result<SharedEngine, OcrError> {
        let key = config.instance_key();

        if let Some(instance) = self.instances.lock().get(&key) {
            return Ok(Arc::clone(instance));
        }

        let tess = create_engine(config)?;
        let instance = Arc::new(Mutex::new(tess));

        // Another scan may have raced us here; keep whichever engine landed first
        let mut instances = self.instances.lock();
        let stored = instances
            .entry(key)
            .or_insert_with(|| Arc::clone(&instance));
        Ok(Arc::clone(stored))
    }

    /// Number of cached engines
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// Drop every cached engine
    pub fn clear(&self) {
        let mut instances = self.instances.lock();
        let count = instances.len();
        instances.clear();
        if count > 0 {
            info!("Cleared {count} OCR instances");
        }
    }
}

/// Build a Tesseract engine with every setting from `config`: the model's
/// tessdata directory, the languages, the page segmentation mode and the
/// optional character whitelist.
///
/// # Errors
///
/// Returns [`OcrError::Initialization`] when Tesseract cannot load the
/// requested languages or rejects a configuration variable.
pub fn create_engine(config: &OcrConfig) -> Result<LepTess, OcrError> {
    info!(
        languages = %config.languages,
        model = config.model_type.tessdata_dir(),
        "Creating new OCR instance"
    );

    let tessdata_path = tessdata_path(config.model_type);
    let mut tess = LepTess::new(tessdata_path.as_deref(), &config.languages).map_err(|e| {
        OcrError::Initialization(format!(
            "Failed to initialize Tesseract for '{}': {}",
            config.languages, e
        ))
    })?;

    tess.set_variable(
        leptess::Variable::TesseditPagesegMode,
        config.psm_mode.as_str(),
    )
    .map_err(|e| OcrError::Initialization(format!("Failed to set PSM mode: {}", e)))?;

    if let Some(whitelist) = &config.character_whitelist {
        tess.set_variable(leptess::Variable::TesseditCharWhitelist, whitelist)
            .map_err(|e| {
                OcrError::Initialization(format!("Failed to set character whitelist: {}", e))
            })?;
    }

    Ok(tess)
}

/// First existing tessdata directory for the model type, if any
fn tessdata_path(model_type: ModelType) -> Option<String> {
    let dir = model_type.tessdata_dir();
    let possible_paths = [
        format!("/usr/share/tesseract-ocr/5/{}", dir),
        format!("/usr/share/tesseract-ocr/4.00/{}", dir),
        format!("/usr/share/{}", dir),
        format!("/usr/local/share/{}", dir),
    ];

    let found = possible_paths
        .into_iter()
        .find(|path| std::path::Path::new(path).exists());

    match &found {
        Some(path) => info!("Using tessdata path: {}", path),
        None => info!(
            "No specific tessdata path found for model type {:?}, using default",
            model_type
        ),
    }
    found
}

impl Default for OcrInstanceManager {
    fn default() -> Self {
        Self::new()
    }
}
