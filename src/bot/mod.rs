//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `callbacks`: All callback query handling (organized into submodules)
//! - `message_handler`: Routes incoming text, photo, and document messages
//! - `command_handlers`: Slash commands
//! - `dialogue_manager`: Text input expected by the current dialogue state
//! - `media_handlers` / `image_processing`: Download, OCR and field extraction
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callbacks;
pub mod command_handlers;
pub mod dialogue_manager;
pub mod image_processing;
pub mod media_handlers;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;
use teloxide::prelude::*;

use crate::instance_manager::OcrInstanceManager;
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::ocr_config::OcrConfig;
use crate::session::SessionStore;

/// Long-lived services shared by every handler
pub struct ScannerServices {
    pub sessions: SessionStore,
    pub localization: Arc<LocalizationManager>,
    pub ocr_config: OcrConfig,
    pub ocr_instances: OcrInstanceManager,
    /// Client for file downloads and API submissions (no global timeout)
    pub http_client: reqwest::Client,
}

/// Common context for bot handlers containing shared dependencies
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    pub bot: &'a Bot,
    pub services: &'a ScannerServices,
    pub chat_id: ChatId,
    pub language_code: Option<&'a str>,
}

impl<'a> HandlerContext<'a> {
    /// Localized message in the user's language
    pub fn t(&self, key: &str) -> String {
        t_lang(&self.services.localization, key, self.language_code)
    }

    /// Localized message with arguments in the user's language
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        t_args_lang(&self.services.localization, key, args, self.language_code)
    }

    /// Send a plain text message to the current chat
    pub async fn reply(&self, text: impl Into<String>) -> anyhow::Result<Message> {
        Ok(self.bot.send_message(self.chat_id, text.into()).await?)
    }
}

/// Extract the user's language code from Telegram
pub fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

// Re-export main handler functions for use in main.rs
pub use callbacks::callback_handler::{callback_chat_id, callback_handler};
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use image_processing::{download_file, process_image_bytes};
pub use ui_builder::{create_documents_keyboard, create_form_keyboard, format_form, mask_api_key};
