//! Command Handlers module for processing bot commands

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile, MessageId};
use tracing::{debug, info};

use crate::dialogue::{ScanDialogue, ScanDialogueState};
use crate::submission::{parse_headers, probe_endpoint, submit_fields};

use super::dialogue_manager::{apply_api_key, apply_endpoint, apply_headers};
use super::ui_builder::{
    create_documents_keyboard, create_form_keyboard, format_api_config, format_documents_list,
    format_field_labels, format_form, truncate_label,
};
use super::HandlerContext;

/// Telegram rejects messages above 4096 characters
const MAX_TEXT_MESSAGE_CHARS: usize = 3500;

/// A slash command and its argument text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub args: &'a str,
}

/// Split `/name@bot args` into its parts. Returns `None` for plain text.
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name,
        args: args.trim(),
    })
}

/// Route a command. Returns false when the command is unknown.
pub async fn handle_command(
    ctx: &HandlerContext<'_>,
    dialogue: &ScanDialogue,
    command: ParsedCommand<'_>,
) -> Result<bool> {
    debug!(user_id = %ctx.chat_id, command = command.name, "Handling command");

    match command.name {
        "start" => handle_start_command(ctx).await?,
        "help" => handle_help_command(ctx).await?,
        "documents" => send_documents(ctx).await?,
        "form" => send_form(ctx).await?,
        "text" => handle_text_command(ctx).await?,
        "preview" => handle_preview_command(ctx).await?,
        "endpoint" => {
            if command.args.is_empty() {
                prompt_for(ctx, dialogue, ScanDialogueState::AwaitingEndpoint, "endpoint-prompt")
                    .await?;
            } else {
                apply_endpoint(ctx, command.args).await?;
            }
        }
        "apikey" => {
            if command.args.is_empty() {
                prompt_for(ctx, dialogue, ScanDialogueState::AwaitingApiKey, "apikey-prompt")
                    .await?;
            } else {
                apply_api_key(ctx, command.args).await?;
            }
        }
        "headers" => {
            if command.args.is_empty() {
                prompt_for(ctx, dialogue, ScanDialogueState::AwaitingHeaders, "headers-prompt")
                    .await?;
            } else {
                apply_headers(ctx, command.args).await?;
            }
        }
        "config" => {
            let api = ctx
                .services
                .sessions
                .with_session(ctx.chat_id.0, |session| session.api.clone());
            ctx.reply(format_api_config(
                &api,
                &ctx.services.localization,
                ctx.language_code,
            ))
            .await?;
        }
        "test" => test_connection(ctx).await?,
        "submit" => submit_form(ctx).await?,
        "reset" => {
            ctx.services.sessions.reset(ctx.chat_id.0);
            dialogue.reset().await?;
            info!(user_id = %ctx.chat_id, "Session reset");
            ctx.reply(ctx.t("session-reset")).await?;
        }
        "cancel" => {
            // Only reached outside an input state
            ctx.reply(ctx.t("nothing-to-cancel")).await?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}

/// Handle the /start command
pub async fn handle_start_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let welcome_message = format!(
        "👋 {}\n\n{}\n\n{}\n{}",
        ctx.t("welcome-title"),
        ctx.t("welcome-description"),
        ctx.t("welcome-send-image"),
        ctx.t("welcome-help"),
    );
    ctx.reply(welcome_message).await?;
    Ok(())
}

/// Handle the /help command
pub async fn handle_help_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let help_message = [
        ctx.t("help-title"),
        [
            ctx.t("help-step1"),
            ctx.t("help-step2"),
            ctx.t("help-step3"),
            ctx.t("help-step4"),
        ]
        .join("\n"),
        ctx.t("help-formats"),
        format!("{}\n{}", ctx.t("help-commands"), ctx.t("help-command-list")),
    ]
    .join("\n\n");
    ctx.reply(help_message).await?;
    Ok(())
}

async fn prompt_for(
    ctx: &HandlerContext<'_>,
    dialogue: &ScanDialogue,
    state: ScanDialogueState,
    prompt_key: &str,
) -> Result<()> {
    dialogue.update(state).await?;
    ctx.reply(ctx.t(prompt_key)).await?;
    Ok(())
}

/// Send the form of the selected document with its keyboard
pub async fn send_form(ctx: &HandlerContext<'_>) -> Result<()> {
    let (text, keyboard) = render_form(ctx);
    match keyboard {
        Some(keyboard) => {
            ctx.bot
                .send_message(ctx.chat_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            ctx.reply(text).await?;
        }
    }
    Ok(())
}

/// Form text, plus its keyboard when a document is selected
fn render_form(ctx: &HandlerContext<'_>) -> (String, Option<InlineKeyboardMarkup>) {
    let localization = &ctx.services.localization;
    ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        let text = format_form(session, localization, ctx.language_code);
        let keyboard = session
            .selected_document()
            .map(|_| create_form_keyboard(&session.form, localization, ctx.language_code));
        (text, keyboard)
    })
}

/// Redraw an existing form message in place
pub async fn refresh_form(ctx: &HandlerContext<'_>, message_id: MessageId) -> Result<()> {
    let (text, keyboard) = render_form(ctx);
    match keyboard {
        Some(keyboard) => {
            ctx.bot
                .edit_message_text(ctx.chat_id, message_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            ctx.bot
                .edit_message_text(ctx.chat_id, message_id, text)
                .await?;
        }
    }
    Ok(())
}

/// Send the document list with select/remove buttons
pub async fn send_documents(ctx: &HandlerContext<'_>) -> Result<()> {
    let localization = &ctx.services.localization;
    let (text, keyboard) = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        let text = format_documents_list(session, localization, ctx.language_code);
        let keyboard = (!session.documents.is_empty())
            .then(|| create_documents_keyboard(session, localization, ctx.language_code));
        (text, keyboard)
    });

    match keyboard {
        Some(keyboard) => {
            ctx.bot
                .send_message(ctx.chat_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            ctx.reply(text).await?;
        }
    }
    Ok(())
}

async fn handle_text_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let selected = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session
            .selected_document()
            .map(|document| (document.name.clone(), document.raw_text.clone()))
    });
    let Some((name, raw_text)) = selected else {
        ctx.reply(ctx.t("form-no-document")).await?;
        return Ok(());
    };

    if raw_text.is_empty() {
        ctx.reply(ctx.t_args("text-empty", &[("name", &name)])).await?;
        return Ok(());
    }

    ctx.reply(format!(
        "{}\n\n{}",
        ctx.t_args("text-title", &[("name", &name)]),
        truncate_label(&raw_text, MAX_TEXT_MESSAGE_CHARS)
    ))
    .await?;
    Ok(())
}

async fn handle_preview_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let selected = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session
            .selected_document()
            .map(|document| (document.name.clone(), document.preprocessed_image.clone()))
    });
    let Some((name, preprocessed_image)) = selected else {
        ctx.reply(ctx.t("form-no-document")).await?;
        return Ok(());
    };

    let photo =
        InputFile::memory(preprocessed_image).file_name(format!("preprocessed-{}.png", name));
    ctx.bot
        .send_photo(ctx.chat_id, photo)
        .caption(ctx.t_args("preview-caption", &[("name", &name)]))
        .await?;
    Ok(())
}

/// Tell the user when their header JSON is being replaced by the default
async fn warn_about_headers(ctx: &HandlerContext<'_>, headers_json: &str) -> Result<()> {
    if let Some(warning) = parse_headers(headers_json).warning {
        ctx.reply(format!(
            "⚠️ {}",
            ctx.t_args("headers-warning", &[("warning", &warning)])
        ))
        .await?;
    }
    Ok(())
}

/// Probe the configured endpoint and report the result
pub async fn test_connection(ctx: &HandlerContext<'_>) -> Result<()> {
    let api = ctx
        .services
        .sessions
        .with_session(ctx.chat_id.0, |session| session.api.clone());
    if !api.is_configured() {
        ctx.reply(ctx.t("submit-no-endpoint")).await?;
        return Ok(());
    }

    warn_about_headers(ctx, &api.headers_json).await?;
    ctx.reply(ctx.t("test-running")).await?;

    let message = match probe_endpoint(&ctx.services.http_client, &api).await {
        Ok(report) if report.is_success() => format!(
            "✅ {}",
            ctx.t_args(
                "test-success",
                &[
                    ("status", &report.status.to_string()),
                    ("ms", &report.duration.as_millis().to_string()),
                ],
            )
        ),
        Ok(report) => format!(
            "⚠️ {}",
            ctx.t_args(
                "test-unexpected-status",
                &[("status", &report.status.to_string())]
            )
        ),
        Err(e) => format!("❌ {}", ctx.t_args("test-failed", &[("error", &e.to_string())])),
    };
    ctx.reply(message).await?;
    Ok(())
}

/// Submit the current form to the configured endpoint
pub async fn submit_form(ctx: &HandlerContext<'_>) -> Result<()> {
    let (has_document, api, form) = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        (
            session.selected_document().is_some(),
            session.api.clone(),
            session.form.clone(),
        )
    });
    if !has_document {
        ctx.reply(ctx.t("submit-no-document")).await?;
        return Ok(());
    }
    if !api.is_configured() {
        ctx.reply(ctx.t("submit-no-endpoint")).await?;
        return Ok(());
    }

    let missing = form.missing_fields();
    if !missing.is_empty() {
        ctx.reply(format!(
            "⚠️ {}",
            ctx.t_args(
                "form-missing",
                &[(
                    "fields",
                    &format_field_labels(&missing, &ctx.services.localization, ctx.language_code)
                )],
            )
        ))
        .await?;
    }
    warn_about_headers(ctx, &api.headers_json).await?;
    ctx.reply(ctx.t("submit-sending")).await?;

    let message = match submit_fields(&ctx.services.http_client, &api, &form).await {
        Ok(receipt) => {
            info!(user_id = %ctx.chat_id, status = receipt.status, "Form submitted");
            format!(
                "✅ {}",
                ctx.t_args("submit-success", &[("status", &receipt.status.to_string())])
            )
        }
        Err(e) => format!("❌ {}", ctx.t_args("submit-failed", &[("error", &e.to_string())])),
    };
    ctx.reply(message).await?;
    Ok(())
}
