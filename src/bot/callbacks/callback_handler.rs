//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage};
use tracing::{debug, warn, Instrument};

use crate::dialogue::ScanDialogue;
use crate::errors::error_logging;
use crate::observability;

use super::callback_types::CallbackAction;
use super::{document_callbacks, form_callbacks};
use crate::bot::command_handlers::{send_documents, submit_form};
use crate::bot::{HandlerContext, ScannerServices};

/// Chat of the message that carried the keyboard, or the user's private chat
pub fn callback_chat_id(q: &CallbackQuery) -> ChatId {
    match &q.message {
        Some(MaybeInaccessibleMessage::Regular(msg)) => msg.chat.id,
        Some(MaybeInaccessibleMessage::Inaccessible(msg)) => msg.chat.id,
        None => ChatId::from(q.from.id),
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: ScanDialogue,
    services: Arc<ScannerServices>,
) -> Result<()> {
    let chat_id = callback_chat_id(&q);
    let span = observability::telegram_span("callback_handler", Some(chat_id.0));

    async move {
        observability::record_telegram_message("callback");

        // Answer the callback query to remove the loading state
        bot.answer_callback_query(q.id.clone()).await?;

        let data = q.data.as_deref().unwrap_or("");
        let Some(action) = CallbackAction::parse(data) else {
            warn!(user_id = %chat_id, data = %data, "Ignoring unknown callback data");
            return Ok(());
        };
        debug!(user_id = %chat_id, action = ?action, "Handling callback");

        let ctx = HandlerContext {
            bot: &bot,
            services: &services,
            chat_id,
            language_code: q.from.language_code.as_deref(),
        };
        let message_id = q.message.as_ref().map(|msg| msg.id());

        let result = match action {
            CallbackAction::EditField(field) => {
                form_callbacks::handle_edit_field(&ctx, &dialogue, field, message_id).await
            }
            CallbackAction::Submit => submit_form(&ctx).await,
            CallbackAction::ResetForm => form_callbacks::handle_reset_form(&ctx, message_id).await,
            CallbackAction::Documents => send_documents(&ctx).await,
            CallbackAction::SelectDocument(index) => {
                document_callbacks::handle_select_document(&ctx, index, message_id).await
            }
            CallbackAction::RemoveDocument(index) => {
                document_callbacks::handle_remove_document(&ctx, index, message_id).await
            }
        };

        if let Err(e) = &result {
            error_logging::log_internal_error(e, "callback_handler", data, Some(chat_id.0));
        }
        result
    }
    .instrument(span)
    .await
}
