//! Form callbacks: start a field edit, throw away edits

use anyhow::Result;
use teloxide::types::MessageId;
use tracing::{debug, info};

use crate::bot::command_handlers::{refresh_form, send_form};
use crate::bot::HandlerContext;
use crate::dialogue::{ScanDialogue, ScanDialogueState};
use crate::field_extraction::FieldKey;

/// Ask for a new value of `field`; the form message is refreshed once it arrives
pub async fn handle_edit_field(
    ctx: &HandlerContext<'_>,
    dialogue: &ScanDialogue,
    field: FieldKey,
    form_message_id: Option<MessageId>,
) -> Result<()> {
    let has_document = ctx
        .services
        .sessions
        .with_session(ctx.chat_id.0, |session| session.selected_document().is_some());
    if !has_document {
        ctx.reply(ctx.t("form-no-document")).await?;
        return Ok(());
    }

    dialogue
        .update(ScanDialogueState::EditingField {
            field,
            form_message_id: form_message_id.map(|id| id.0),
        })
        .await?;
    debug!(user_id = %ctx.chat_id, field = %field, "Waiting for new field value");

    let label = ctx.t(field.label_key());
    ctx.reply(format!(
        "✏️ {}",
        ctx.t_args("edit-field-prompt", &[("field", &label)])
    ))
    .await?;
    Ok(())
}

/// Restore the selected document's scanned values
pub async fn handle_reset_form(
    ctx: &HandlerContext<'_>,
    form_message_id: Option<MessageId>,
) -> Result<()> {
    ctx.services
        .sessions
        .with_session(ctx.chat_id.0, |session| session.reset_form());
    info!(user_id = %ctx.chat_id, "Form reset to scanned values");

    ctx.reply(ctx.t("form-reset")).await?;
    match form_message_id {
        Some(id) => {
            if let Err(e) = refresh_form(ctx, id).await {
                // Telegram refuses edits that change nothing
                debug!(error = %e, "Form message not refreshed");
            }
        }
        None => send_form(ctx).await?,
    }
    Ok(())
}
