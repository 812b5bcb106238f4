//! Dialogue Manager module for handling dialogue state transitions
//!
//! Text typed while the bot waits for a field value or an API setting ends
//! up here. `/cancel` leaves any input state without changing anything.

use anyhow::Result;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info, warn};

use crate::dialogue::{ScanDialogue, ScanDialogueState};
use crate::errors::error_logging;
use crate::field_extraction::FieldKey;
use crate::submission::parse_headers;

use super::command_handlers::{parse_command, refresh_form, send_form, ParsedCommand};
use super::HandlerContext;

/// What a text message means while the dialogue waits for input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput<'a> {
    /// `/cancel`, with or without a bot suffix or trailing words
    Cancel,
    /// Plain text, taken as the requested value
    Value(&'a str),
    /// Any other command; it abandons the pending input
    Command(ParsedCommand<'a>),
}

pub fn classify_pending_input(text: &str) -> PendingInput<'_> {
    match parse_command(text) {
        Some(command) if command.name == "cancel" => PendingInput::Cancel,
        Some(command) => PendingInput::Command(command),
        None => PendingInput::Value(text),
    }
}

/// Normalize a user-typed endpoint. Only absolute http(s) URLs are accepted.
pub fn normalize_endpoint_url(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Handle text sent while the dialogue expects input.
///
/// The dialogue returns to `Start` once the input is accepted; invalid
/// input keeps the state so the user can try again.
pub async fn handle_dialogue_input(
    ctx: &HandlerContext<'_>,
    dialogue: &ScanDialogue,
    state: ScanDialogueState,
    text: &str,
) -> Result<()> {
    if classify_pending_input(text) == PendingInput::Cancel {
        dialogue.exit().await?;
        ctx.reply(ctx.t("edit-cancelled")).await?;
        return Ok(());
    }

    debug!(user_id = %ctx.chat_id, state = ?state, "Handling dialogue input");

    let accepted = match state {
        ScanDialogueState::Start => return Ok(()),
        ScanDialogueState::EditingField {
            field,
            form_message_id,
        } => handle_field_edit_input(ctx, field, form_message_id, text).await?,
        ScanDialogueState::AwaitingEndpoint => apply_endpoint(ctx, text).await?,
        ScanDialogueState::AwaitingApiKey => apply_api_key(ctx, text).await?,
        ScanDialogueState::AwaitingHeaders => apply_headers(ctx, text).await?,
    };

    if accepted {
        dialogue.exit().await?;
    }
    Ok(())
}

async fn handle_field_edit_input(
    ctx: &HandlerContext<'_>,
    field: FieldKey,
    form_message_id: Option<i32>,
    text: &str,
) -> Result<bool> {
    let value = text.trim();
    if value.is_empty() {
        ctx.reply(ctx.t("error-empty-input")).await?;
        return Ok(false);
    }

    let has_document = ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        if session.selected_document().is_none() {
            return false;
        }
        session.update_field(field, value);
        true
    });
    if !has_document {
        ctx.reply(ctx.t("form-no-document")).await?;
        return Ok(true);
    }
    info!(user_id = %ctx.chat_id, field = %field, "Form field edited");

    let label = ctx.t(field.label_key());
    ctx.reply(format!(
        "✅ {}",
        ctx.t_args("field-updated", &[("field", &label)])
    ))
    .await?;

    match form_message_id {
        Some(id) => {
            if let Err(e) = refresh_form(ctx, MessageId(id)).await {
                // The old form may be gone or unchanged; show a fresh one
                debug!(error = %e, "Could not refresh form message");
                send_form(ctx).await?;
            }
        }
        None => send_form(ctx).await?,
    }
    Ok(true)
}

/// Set the submission endpoint. Returns false when the URL is rejected.
pub async fn apply_endpoint(ctx: &HandlerContext<'_>, input: &str) -> Result<bool> {
    let Some(url) = normalize_endpoint_url(input) else {
        error_logging::log_validation_error(
            &"invalid endpoint URL",
            "apply_endpoint",
            Some(ctx.chat_id.0),
            "endpoint_url",
            Some(input),
        );
        ctx.reply(ctx.t("endpoint-invalid")).await?;
        return Ok(false);
    };

    ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session.api.endpoint_url = url.clone();
    });
    info!(user_id = %ctx.chat_id, endpoint = %url, "Endpoint configured");
    ctx.reply(ctx.t_args("endpoint-set", &[("url", &url)])).await?;
    Ok(true)
}

/// Set or clear (`clear`) the bearer key
pub async fn apply_api_key(ctx: &HandlerContext<'_>, input: &str) -> Result<bool> {
    let key = input.trim();
    let cleared = key.is_empty() || key.eq_ignore_ascii_case("clear");

    ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session.api.api_key = (!cleared).then(|| key.to_string());
    });
    info!(user_id = %ctx.chat_id, cleared, "API key updated");

    ctx.reply(ctx.t(if cleared { "apikey-cleared" } else { "apikey-set" }))
        .await?;
    Ok(true)
}

/// Store the header JSON as typed. Malformed JSON is kept but reported,
/// since it falls back to the default headers when used.
pub async fn apply_headers(ctx: &HandlerContext<'_>, input: &str) -> Result<bool> {
    let raw = input.trim().to_string();
    let outcome = parse_headers(&raw);

    ctx.services.sessions.with_session(ctx.chat_id.0, |session| {
        session.api.headers_json = raw;
    });

    match outcome.warning {
        Some(warning) => {
            warn!(user_id = %ctx.chat_id, warning = %warning, "Stored header JSON is unusable");
            ctx.reply(format!(
                "⚠️ {}",
                ctx.t_args("headers-warning", &[("warning", &warning)])
            ))
            .await?;
        }
        None => {
            info!(
                user_id = %ctx.chat_id,
                header_count = outcome.headers.len(),
                "Headers configured"
            );
            ctx.reply(ctx.t("headers-set")).await?;
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint_url() {
        assert_eq!(
            normalize_endpoint_url("  https://api.example.com/ids "),
            Some("https://api.example.com/ids".to_string())
        );
        assert_eq!(
            normalize_endpoint_url("http://localhost:8000"),
            Some("http://localhost:8000/".to_string())
        );
    }

    #[test]
    fn test_cancel_is_recognized_with_suffix_and_arguments() {
        assert_eq!(classify_pending_input("/cancel"), PendingInput::Cancel);
        assert_eq!(classify_pending_input("/cancel please"), PendingInput::Cancel);
        assert_eq!(classify_pending_input("  /cancel@IdScannerBot now "), PendingInput::Cancel);
    }

    #[test]
    fn test_pending_input_values_and_other_commands() {
        assert_eq!(classify_pending_input("Mary Ann"), PendingInput::Value("Mary Ann"));
        assert_eq!(
            classify_pending_input("https://api.example.com/ids"),
            PendingInput::Value("https://api.example.com/ids")
        );
        assert_eq!(
            classify_pending_input("/form"),
            PendingInput::Command(ParsedCommand {
                name: "form",
                args: ""
            })
        );
        // Only an exact command name cancels
        assert!(matches!(
            classify_pending_input("/cancellation"),
            PendingInput::Command(_)
        ));
    }

    #[test]
    fn test_normalize_endpoint_url_rejects_other_input() {
        assert_eq!(normalize_endpoint_url("api.example.com"), None);
        assert_eq!(normalize_endpoint_url("ftp://example.com/upload"), None);
        assert_eq!(normalize_endpoint_url(""), None);
    }
}
