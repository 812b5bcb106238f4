//! # ID Document Scanner Telegram Bot
//!
//! A Telegram bot that reads identity documents: it cleans up photos and
//! uploads with a fixed binarization pipeline, runs Tesseract OCR, extracts
//! the holder's identity fields into an editable form and submits the form
//! to a configurable HTTP API.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod field_extraction;
pub mod instance_manager;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod ocr;
pub mod ocr_config;
pub mod ocr_errors;
pub mod preprocessing;
pub mod session;
pub mod submission;

// Re-export types for easier access
pub use field_extraction::{extract_fields, FieldKey, FieldSet};
pub use session::{ApiConfig, Document, ScanSession, SessionStore};
