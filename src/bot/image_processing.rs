//! Image Processing module for OCR and image handling

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, info, warn};

use crate::errors::{error_logging, AppError, AppResult};
use crate::field_extraction::{extract_fields, FieldSet};
use crate::instance_manager::OcrInstanceManager;
use crate::ocr::{extract_text_from_image, validate_image_bytes};
use crate::ocr_config::OcrConfig;
use crate::ocr_errors::OcrError;
use crate::observability;
use crate::preprocessing::{decode_image, encode_png, preprocess_for_ocr};
use crate::session::Document;

use super::command_handlers::send_form;
use super::HandlerContext;

/// Everything the pipeline produces for one image
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Binary image given to Tesseract, PNG-encoded
    pub preprocessed_png: Vec<u8>,
    pub raw_text: String,
    pub fields: FieldSet,
}

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, client: &reqwest::Client, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = client.get(&url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Validate, preprocess, recognize and extract the fields of one image
pub async fn process_image_bytes(
    bytes: &[u8],
    config: &OcrConfig,
    instances: &OcrInstanceManager,
) -> AppResult<ScanOutput> {
    let format = validate_image_bytes(bytes, config).map_err(|e| match e {
        OcrError::Validation(msg) => AppError::Validation(msg),
        other => AppError::from(other),
    })?;
    debug!(format = ?format, size = bytes.len(), "Image validated");

    let image = decode_image(bytes)?;
    let preprocessed = preprocess_for_ocr(&image)?;
    let preprocessed_png = encode_png(&preprocessed.image)?;

    let raw_text = extract_text_from_image(&preprocessed.image, config, instances).await?;
    let fields = extract_fields(&raw_text);
    observability::record_extraction_metrics(fields.filled_count());

    info!(
        fields_found = fields.filled_count(),
        chars_extracted = raw_text.len(),
        "Field extraction completed"
    );

    Ok(ScanOutput {
        preprocessed_png,
        raw_text,
        fields,
    })
}

/// Localized message for a failed scan
fn scan_error_message(ctx: &HandlerContext<'_>, error: &AppError) -> String {
    let detail = match error {
        AppError::Validation(msg)
        | AppError::Preprocessing(msg)
        | AppError::Ocr(msg)
        | AppError::Internal(msg) => msg.clone(),
        other => other.to_string(),
    };
    let key = match error {
        AppError::Validation(_) | AppError::Preprocessing(_) => "error-invalid-image",
        _ => "error-ocr-failed",
    };
    ctx.t_args(key, &[("error", &detail)])
}

/// Download an image, scan it and add it to the chat's session.
///
/// Every failure ends with a message to the user; only Telegram send errors
/// are returned.
pub async fn download_and_process_image(
    ctx: &HandlerContext<'_>,
    file_id: FileId,
    document_name: String,
    processing_message_key: &str,
) -> Result<()> {
    ctx.reply(ctx.t(processing_message_key)).await?;

    let bytes = match download_file(ctx.bot, &ctx.services.http_client, file_id).await {
        Ok(bytes) => {
            debug!(user_id = %ctx.chat_id, size = bytes.len(), "Image downloaded successfully");
            bytes
        }
        Err(e) => {
            error_logging::log_network_error(&e, "download_file", None, None);
            ctx.reply(ctx.t("error-download-failed")).await?;
            return Ok(());
        }
    };

    let output = match process_image_bytes(
        &bytes,
        &ctx.services.ocr_config,
        &ctx.services.ocr_instances,
    )
    .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!(user_id = %ctx.chat_id, error = %e, "Image scan failed");
            ctx.reply(scan_error_message(ctx, &e)).await?;
            return Ok(());
        }
    };

    let found = output.fields.filled_count();
    let text_is_empty = output.raw_text.is_empty();
    let document = Document::new(
        document_name.clone(),
        bytes,
        output.preprocessed_png,
        output.raw_text,
        output.fields,
    );
    let index = ctx
        .services
        .sessions
        .with_session(ctx.chat_id.0, |session| session.add_document(document));
    info!(user_id = %ctx.chat_id, index, name = %document_name, "Document added to session");

    ctx.reply(ctx.t_args(
        "scan-complete",
        &[("name", &document_name), ("count", &found.to_string())],
    ))
    .await?;
    if text_is_empty {
        ctx.reply(ctx.t("no-text-found")).await?;
    }

    send_form(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_rejects_empty_bytes() {
        let result = process_image_bytes(&[], &OcrConfig::default(), &OcrInstanceManager::new()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_process_rejects_unknown_format() {
        let garbage = vec![0x42u8; 64];
        let result =
            process_image_bytes(&garbage, &OcrConfig::default(), &OcrInstanceManager::new()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
