//! Media Handlers module for processing photo and document messages

use anyhow::Result;
use chrono::Utc;
use teloxide::prelude::*;
use tracing::debug;

use super::image_processing::download_and_process_image;
use super::HandlerContext;

/// File extensions accepted for uploaded documents
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Name given to camera captures, which arrive without a file name
pub fn capture_name(timestamp: chrono::DateTime<Utc>) -> String {
    format!("capture-{}.jpg", timestamp.format("%Y%m%d-%H%M%S"))
}

/// True for uploads whose name or MIME type marks a supported image.
///
/// The byte-level check in OCR validation still runs afterwards.
pub fn is_supported_upload(file_name: Option<&str>, mime_type: Option<&str>) -> bool {
    let extension_ok = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

    match (extension_ok, mime_type) {
        (Some(ok), _) => ok,
        (None, Some(mime)) => matches!(mime, "image/jpeg" | "image/png" | "image/bmp" | "image/x-ms-bmp"),
        (None, None) => false,
    }
}

/// Handle photo messages
pub async fn handle_photo_message(ctx: &HandlerContext<'_>, msg: &Message) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received photo message from user");

    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        download_and_process_image(
            ctx,
            largest_photo.file.id.clone(),
            capture_name(Utc::now()),
            "processing-photo",
        )
        .await?;
    }
    Ok(())
}

/// Handle document messages
pub async fn handle_document_message(ctx: &HandlerContext<'_>, msg: &Message) -> Result<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    let mime_type = doc.mime_type.as_ref().map(|mime| mime.essence_str().to_string());
    if doc.file_name.is_none() && mime_type.is_none() {
        debug!(user_id = %msg.chat.id, "Received document without name or mime type from user");
        ctx.reply(ctx.t("error-no-mime-type")).await?;
        return Ok(());
    }

    if !is_supported_upload(doc.file_name.as_deref(), mime_type.as_deref()) {
        debug!(
            user_id = %msg.chat.id,
            file_name = ?doc.file_name,
            mime_type = ?mime_type,
            "Received unsupported document from user"
        );
        ctx.reply(ctx.t("error-unsupported-format")).await?;
        return Ok(());
    }

    debug!(user_id = %msg.chat.id, file_name = ?doc.file_name, "Received image document from user");
    let name = doc
        .file_name
        .clone()
        .unwrap_or_else(|| capture_name(Utc::now()).replacen("capture", "upload", 1));

    download_and_process_image(ctx, doc.file.id.clone(), name, "processing-document").await
}
