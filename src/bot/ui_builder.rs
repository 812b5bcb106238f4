//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::field_extraction::{FieldKey, FieldSet};
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::session::{ApiConfig, ScanSession};

use super::callbacks::callback_types::CallbackAction;

/// Longest value shown inside a button before it is cut
const MAX_BUTTON_VALUE_CHARS: usize = 24;

/// Cut `text` to `max_chars` characters, ending with "..." when shortened
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Show only the last four characters of an API key
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn field_value_display(
    value: &str,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    if value.is_empty() {
        t_lang(localization, "form-empty-value", language_code)
    } else {
        value.to_string()
    }
}

/// Format the form message for the selected document
pub fn format_form(
    session: &ScanSession,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let Some(document) = session.selected_document() else {
        return t_lang(localization, "form-no-document", language_code);
    };

    let mut title = format!("📋 {}", t_lang(localization, "form-title", language_code));
    if session.form_edited {
        title.push(' ');
        title.push_str(&t_lang(localization, "form-edited", language_code));
    }

    let mut lines = vec![
        title,
        t_args_lang(
            localization,
            "form-document",
            &[("name", &document.name)],
            language_code,
        ),
        String::new(),
    ];

    for key in FieldKey::ALL {
        lines.push(format!(
            "{}: {}",
            t_lang(localization, key.label_key(), language_code),
            field_value_display(session.form.get(key), localization, language_code)
        ));
    }

    let missing = session.form.missing_fields();
    if !missing.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "⚠️ {}",
            t_args_lang(
                localization,
                "form-missing",
                &[("fields", &format_field_labels(&missing, localization, language_code))],
                language_code,
            )
        ));
    }

    lines.push(String::new());
    lines.push(t_lang(localization, "form-tap-to-edit", language_code));
    lines.join("\n")
}

/// Comma-separated localized labels
pub fn format_field_labels(
    keys: &[FieldKey],
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    keys.iter()
        .map(|key| t_lang(localization, key.label_key(), language_code))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create the form keyboard: one button per field, then the form actions
pub fn create_form_keyboard(
    form: &FieldSet,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = FieldKey::ALL
        .iter()
        .map(|&key| {
            let label = format!(
                "✏️ {}: {}",
                t_lang(localization, key.label_key(), language_code),
                truncate_label(
                    &field_value_display(form.get(key), localization, language_code),
                    MAX_BUTTON_VALUE_CHARS
                )
            );
            vec![InlineKeyboardButton::callback(
                label,
                CallbackAction::EditField(key).to_string(),
            )]
        })
        .collect();

    buttons.push(vec![
        InlineKeyboardButton::callback(
            format!("📤 {}", t_lang(localization, "button-submit", language_code)),
            CallbackAction::Submit.to_string(),
        ),
        InlineKeyboardButton::callback(
            format!("↩️ {}", t_lang(localization, "button-reset-form", language_code)),
            CallbackAction::ResetForm.to_string(),
        ),
    ]);
    buttons.push(vec![InlineKeyboardButton::callback(
        format!("📚 {}", t_lang(localization, "button-documents", language_code)),
        CallbackAction::Documents.to_string(),
    )]);

    InlineKeyboardMarkup::new(buttons)
}

/// Format the documents list message
pub fn format_documents_list(
    session: &ScanSession,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    if session.documents.is_empty() {
        return format!(
            "📚 {}",
            t_lang(localization, "documents-empty", language_code)
        );
    }

    let count = session.documents.len().to_string();
    let mut lines = vec![format!(
        "📚 {}",
        t_args_lang(localization, "documents-title", &[("count", &count)], language_code)
    )];
    for (index, document) in session.documents.iter().enumerate() {
        let marker = if session.selected == Some(index) { "✅" } else { "▫️" };
        lines.push(format!(
            "{} {}. {} ({}/5)",
            marker,
            index + 1,
            document.name,
            document.extracted.filled_count()
        ));
    }
    lines.join("\n")
}

/// Create the documents keyboard: select and remove buttons per document
pub fn create_documents_keyboard(
    session: &ScanSession,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let remove_label = t_lang(localization, "button-remove", language_code);

    let buttons = session
        .documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let marker = if session.selected == Some(index) { "✅ " } else { "" };
            vec![
                InlineKeyboardButton::callback(
                    format!("{}{}", marker, truncate_label(&document.name, MAX_BUTTON_VALUE_CHARS)),
                    CallbackAction::SelectDocument(index).to_string(),
                ),
                InlineKeyboardButton::callback(
                    format!("🗑️ {}", remove_label),
                    CallbackAction::RemoveDocument(index).to_string(),
                ),
            ]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// Format the API settings with the key masked
pub fn format_api_config(
    api: &ApiConfig,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let not_set = t_lang(localization, "config-not-set", language_code);
    let endpoint = if api.is_configured() {
        api.endpoint_url.clone()
    } else {
        not_set.clone()
    };
    let key = api
        .api_key
        .as_deref()
        .map(mask_api_key)
        .unwrap_or(not_set);

    [
        format!("⚙️ {}", t_lang(localization, "config-title", language_code)),
        t_args_lang(localization, "config-endpoint", &[("url", &endpoint)], language_code),
        t_args_lang(localization, "config-apikey", &[("key", &key)], language_code),
        t_args_lang(
            localization,
            "config-headers",
            &[("headers", &api.headers_json)],
            language_code,
        ),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Document;

    fn manager() -> LocalizationManager {
        LocalizationManager::new().unwrap()
    }

    fn document(name: &str, first_name: &str) -> Document {
        let mut fields = FieldSet::default();
        fields.set(FieldKey::FirstName, first_name);
        Document::new(name, vec![1], vec![2], "", fields)
    }

    fn callback_data(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("abc"), "****");
        assert_eq!(mask_api_key("sk-live-123456"), "****3456");
    }

    #[test]
    fn test_truncate_label_is_char_safe() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("Élodie-Françoise", 8), "Élodi...");
    }

    #[test]
    fn test_form_keyboard_layout() {
        let manager = manager();
        let keyboard = create_form_keyboard(&FieldSet::default(), &manager, Some("en"));
        assert_eq!(
            callback_data(&keyboard),
            vec![
                "edit_field:first_name",
                "edit_field:last_name",
                "edit_field:date_of_birth",
                "edit_field:place_of_birth",
                "edit_field:id_number",
                "submit",
                "reset_form",
                "documents",
            ]
        );
    }

    #[test]
    fn test_format_form_shows_values_and_missing_fields() {
        let manager = manager();
        let mut session = ScanSession::default();
        assert_eq!(
            format_form(&session, &manager, Some("en")),
            "No document yet. Send a photo or an image file to start."
        );

        session.add_document(document("passport.png", "Jane"));
        let text = format_form(&session, &manager, Some("en"));
        assert!(text.contains("Document: passport.png"));
        assert!(text.contains("First name: Jane"));
        assert!(text.contains("Last name: (empty)"));
        assert!(text.contains("Empty fields: Last name, Date of birth"));
        assert!(!text.contains("(edited)"));

        session.update_field(FieldKey::LastName, "Doe");
        let text = format_form(&session, &manager, Some("en"));
        assert!(text.contains("(edited)"));
        assert!(text.contains("Last name: Doe"));
    }

    #[test]
    fn test_documents_keyboard() {
        let manager = manager();
        let mut session = ScanSession::default();
        session.add_document(document("a.jpg", "A"));
        session.add_document(document("b.jpg", "B"));

        let keyboard = create_documents_keyboard(&session, &manager, None);
        assert_eq!(
            callback_data(&keyboard),
            vec!["select_doc:0", "remove_doc:0", "select_doc:1", "remove_doc:1"]
        );

        let listing = format_documents_list(&session, &manager, None);
        assert!(listing.contains("Scanned documents (2)"));
        assert!(listing.contains("✅ 2. b.jpg (1/5)"));
    }

    #[test]
    fn test_api_config_masks_key() {
        let manager = manager();
        let api = ApiConfig {
            endpoint_url: "https://api.example.com".to_string(),
            api_key: Some("supersecretkey".to_string()),
            ..Default::default()
        };
        let text = format_api_config(&api, &manager, Some("en"));
        assert!(text.contains("Endpoint: https://api.example.com"));
        assert!(text.contains("API key: ****tkey"));
        assert!(!text.contains("supersecretkey"));

        let text = format_api_config(&ApiConfig::default(), &manager, Some("en"));
        assert!(text.contains("Endpoint: not set"));
    }
}
