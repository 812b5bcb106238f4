//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, Instrument};

use crate::dialogue::{ScanDialogue, ScanDialogueState};
use crate::errors::error_logging;
use crate::observability;

use super::command_handlers::{handle_command, parse_command};
use super::dialogue_manager::{classify_pending_input, handle_dialogue_input, PendingInput};
use super::media_handlers::{handle_document_message, handle_photo_message};
use super::{message_language, HandlerContext, ScannerServices};

async fn handle_text_message(
    ctx: &HandlerContext<'_>,
    msg: &Message,
    dialogue: ScanDialogue,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Check dialogue state first
    let state = dialogue.get().await?.unwrap_or_default();
    if state.expects_text() {
        // Commands other than /cancel abandon the pending input
        match classify_pending_input(text) {
            PendingInput::Cancel | PendingInput::Value(_) => {
                return handle_dialogue_input(ctx, &dialogue, state, text).await;
            }
            PendingInput::Command(_) => dialogue.update(ScanDialogueState::Start).await?,
        }
    }

    if let Some(command) = parse_command(text) {
        if handle_command(ctx, &dialogue, command).await? {
            return Ok(());
        }
    }

    ctx.reply(ctx.t("unsupported-message")).await?;
    Ok(())
}

async fn handle_unsupported_message(ctx: &HandlerContext<'_>, msg: &Message) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
    ctx.reply(ctx.t("unsupported-message")).await?;
    Ok(())
}

/// Entry point for every message update
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: ScanDialogue,
    services: Arc<ScannerServices>,
) -> Result<()> {
    let span = observability::telegram_span("message_handler", Some(msg.chat.id.0));

    async move {
        let message_type = if msg.text().is_some() {
            "text"
        } else if msg.photo().is_some() {
            "photo"
        } else if msg.document().is_some() {
            "document"
        } else {
            "unsupported"
        };
        observability::record_telegram_message(message_type);

        let ctx = HandlerContext {
            bot: &bot,
            services: &services,
            chat_id: msg.chat.id,
            language_code: message_language(&msg),
        };

        let result = match message_type {
            "text" => handle_text_message(&ctx, &msg, dialogue).await,
            "photo" => handle_photo_message(&ctx, &msg).await,
            "document" => handle_document_message(&ctx, &msg).await,
            _ => handle_unsupported_message(&ctx, &msg).await,
        };

        if let Err(e) = &result {
            error_logging::log_internal_error(
                e,
                "message_handler",
                message_type,
                Some(msg.chat.id.0),
            );
        }
        result
    }
    .instrument(span)
    .await
}
