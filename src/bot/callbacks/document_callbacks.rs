//! Document list callbacks: select and remove scanned documents

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info};

use crate::bot::command_handlers::send_form;
use crate::bot::ui_builder::{create_documents_keyboard, format_documents_list};
use crate::bot::HandlerContext;

/// Select a document and show its form
pub async fn handle_select_document(
    ctx: &HandlerContext<'_>,
    index: usize,
    list_message_id: Option<MessageId>,
) -> Result<()> {
    let selected = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session.select(index).map(|document| document.name.clone())
    });

    let name = match selected {
        Ok(name) => name,
        Err(e) => {
            debug!(user_id = %ctx.chat_id, error = %e, "Stale document selection");
            ctx.reply(ctx.t("error-unknown-document")).await?;
            return Ok(());
        }
    };
    info!(user_id = %ctx.chat_id, index, name = %name, "Document selected");

    if let Some(id) = list_message_id {
        refresh_document_list(ctx, id).await;
    }
    ctx.reply(ctx.t_args("document-selected", &[("name", &name)]))
        .await?;
    send_form(ctx).await
}

/// Remove a document and redraw the list
pub async fn handle_remove_document(
    ctx: &HandlerContext<'_>,
    index: usize,
    list_message_id: Option<MessageId>,
) -> Result<()> {
    let removed = ctx
        .services
        .sessions
        .with_session(ctx.chat_id.0, |session| session.remove_document(index));

    let document = match removed {
        Ok(document) => document,
        Err(e) => {
            debug!(user_id = %ctx.chat_id, error = %e, "Stale document removal");
            ctx.reply(ctx.t("error-unknown-document")).await?;
            return Ok(());
        }
    };
    info!(user_id = %ctx.chat_id, index, name = %document.name, "Document removed");

    if let Some(id) = list_message_id {
        refresh_document_list(ctx, id).await;
    }
    ctx.reply(ctx.t_args("document-removed", &[("name", &document.name)]))
        .await?;
    Ok(())
}

/// Redraw the document list message; failures only cost a stale list
async fn refresh_document_list(ctx: &HandlerContext<'_>, message_id: MessageId) {
    let localization = &ctx.services.localization;
    let (text, keyboard) = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        (
            format_documents_list(session, localization, ctx.language_code),
            create_documents_keyboard(session, localization, ctx.language_code),
        )
    });

    if let Err(e) = ctx
        .bot
        .edit_message_text(ctx.chat_id, message_id, text)
        .reply_markup(keyboard)
        .await
    {
        debug!(error = %e, "Document list not refreshed");
    }
}
