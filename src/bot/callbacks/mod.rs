//! Callbacks module for handling all inline keyboard callback queries
//!
//! This module is organized into submodules for different types of callbacks:
//! - `callback_handler`: Main routing handler for all callback queries
//! - `callback_types`: The typed callback data carried by buttons
//! - `form_callbacks`: Field editing and form reset
//! - `document_callbacks`: Document selection and removal

pub mod callback_handler;
pub mod callback_types;
pub mod document_callbacks;
pub mod form_callbacks;
