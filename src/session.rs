//! # Scan Session Module
//!
//! In-memory state for one user's scanning session: the uploaded documents,
//! which one is selected, the editable form and the API settings. Nothing in
//! here is persisted; a restart starts every chat from scratch.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::field_extraction::{FieldKey, FieldSet};

/// Header JSON used when the user has not configured any
pub const DEFAULT_HEADERS_JSON: &str = r#"{"Content-Type": "application/json"}"#;

/// One scanned or uploaded document
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    /// Bytes exactly as uploaded
    pub raw_image: Vec<u8>,
    /// Binary image fed to OCR, PNG-encoded
    pub preprocessed_image: Vec<u8>,
    pub raw_text: String,
    pub extracted: FieldSet,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        raw_image: Vec<u8>,
        preprocessed_image: Vec<u8>,
        raw_text: impl Into<String>,
        extracted: FieldSet,
    ) -> Self {
        Self {
            name: name.into(),
            raw_image,
            preprocessed_image,
            raw_text: raw_text.into(),
            extracted,
            created_at: Utc::now(),
        }
    }
}

/// Where and how the form is submitted
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub endpoint_url: String,
    pub api_key: Option<String>,
    /// Raw header JSON as typed by the user; parsed at submission time
    pub headers_json: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: None,
            headers_json: DEFAULT_HEADERS_JSON.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint_url.trim().is_empty()
    }
}

/// Per-user scanning state
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    pub documents: Vec<Document>,
    pub selected: Option<usize>,
    /// Values shown in the form; starts as a copy of the selected document's fields
    pub form: FieldSet,
    /// Set once the user edits any field by hand
    pub form_edited: bool,
    pub api: ApiConfig,
}

impl ScanSession {
    /// New session using the given API defaults
    pub fn with_api(api: ApiConfig) -> Self {
        Self {
            api,
            ..Default::default()
        }
    }

    /// Append a document and make it the selected one. Returns its index.
    pub fn add_document(&mut self, document: Document) -> usize {
        self.documents.push(document);
        let index = self.documents.len() - 1;
        self.mirror(index);
        debug!(index, total = self.documents.len(), "Document added to session");
        index
    }

    /// Select a document; the form is reset to its extracted fields
    pub fn select(&mut self, index: usize) -> AppResult<&Document> {
        if index >= self.documents.len() {
            return Err(AppError::Session(format!(
                "no document at index {} ({} loaded)",
                index,
                self.documents.len()
            )));
        }
        self.mirror(index);
        Ok(&self.documents[index])
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.selected.and_then(|index| self.documents.get(index))
    }

    /// Change one form value. The documents themselves are never modified.
    pub fn update_field(&mut self, key: FieldKey, value: impl Into<String>) {
        self.form.set(key, value.into().trim());
        self.form_edited = true;
    }

    /// Throw away form edits and show the selected document's fields again
    pub fn reset_form(&mut self) {
        match self.selected {
            Some(index) => self.mirror(index),
            None => {
                self.form = FieldSet::default();
                self.form_edited = false;
            }
        }
    }

    /// Remove a document, keeping the selection pointed at the same document
    /// where possible. Removing the selected document selects the previous one
    /// (or the new first one).
    pub fn remove_document(&mut self, index: usize) -> AppResult<Document> {
        if index >= self.documents.len() {
            return Err(AppError::Session(format!(
                "no document at index {} ({} loaded)",
                index,
                self.documents.len()
            )));
        }
        let removed = self.documents.remove(index);

        match self.selected {
            _ if self.documents.is_empty() => {
                self.selected = None;
                self.form = FieldSet::default();
                self.form_edited = false;
            }
            Some(selected) if selected == index => {
                self.mirror(index.saturating_sub(1));
            }
            Some(selected) if selected > index => {
                self.selected = Some(selected - 1);
            }
            _ => {}
        }

        Ok(removed)
    }

    /// Drop every document and clear the form; API settings are kept
    pub fn clear(&mut self) {
        self.documents.clear();
        self.selected = None;
        self.form = FieldSet::default();
        self.form_edited = false;
    }

    fn mirror(&mut self, index: usize) {
        self.selected = Some(index);
        self.form = self.documents[index].extracted.clone();
        self.form_edited = false;
    }
}

/// Sessions for every chat, keyed by chat id
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, ScanSession>>,
    default_api: ApiConfig,
}

impl SessionStore {
    /// Sessions created by this store start with `default_api`
    pub fn new(default_api: ApiConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            default_api,
        }
    }

    /// Run `f` against the chat's session, creating it on first use
    pub fn with_session<R>(&self, chat_id: i64, f: impl FnOnce(&mut ScanSession) -> R) -> R {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .entry(chat_id)
            .or_insert_with(|| ScanSession::with_api(self.default_api.clone()));
        f(session)
    }

    /// Snapshot of the chat's session
    pub fn get(&self, chat_id: i64) -> ScanSession {
        self.with_session(chat_id, |session| session.clone())
    }

    /// Forget everything about the chat, API settings included
    pub fn reset(&self, chat_id: i64) {
        self.sessions.lock().remove(&chat_id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(name: &str, first_name: &str) -> Document {
        let mut fields = FieldSet::default();
        fields.set(FieldKey::FirstName, first_name);
        Document::new(name, vec![1, 2, 3], vec![4, 5], "raw", fields)
    }

    #[test]
    fn test_add_document_selects_and_mirrors() {
        let mut session = ScanSession::default();
        assert!(session.selected_document().is_none());

        let index = session.add_document(document("a.jpg", "Alice"));
        assert_eq!(index, 0);
        assert_eq!(session.selected, Some(0));
        assert_eq!(session.form.first_name, "Alice");

        session.add_document(document("b.jpg", "Bob"));
        assert_eq!(session.selected, Some(1));
        assert_eq!(session.form.first_name, "Bob");
        assert_eq!(session.selected_document().unwrap().name, "b.jpg");
    }

    #[test]
    fn test_select_resets_form_edits() {
        let mut session = ScanSession::default();
        session.add_document(document("a.jpg", "Alice"));
        session.add_document(document("b.jpg", "Bob"));

        session.update_field(FieldKey::FirstName, "Robert");
        assert!(session.form_edited);

        session.select(0).unwrap();
        assert_eq!(session.form.first_name, "Alice");
        assert!(!session.form_edited);

        assert!(matches!(session.select(5), Err(AppError::Session(_))));
        assert_eq!(session.selected, Some(0));
    }

    #[test]
    fn test_update_field_leaves_document_untouched() {
        let mut session = ScanSession::default();
        session.add_document(document("a.jpg", "Alice"));

        session.update_field(FieldKey::IdNumber, "  X-1  ");
        assert_eq!(session.form.id_number, "X-1");
        assert_eq!(session.documents[0].extracted.id_number, "");

        session.reset_form();
        assert_eq!(session.form.id_number, "");
        assert!(!session.form_edited);
    }

    #[test]
    fn test_remove_document_keeps_selection_consistent() {
        let mut session = ScanSession::default();
        session.add_document(document("a.jpg", "A"));
        session.add_document(document("b.jpg", "B"));
        session.add_document(document("c.jpg", "C"));

        // Selected is c (2); removing a shifts it down
        session.remove_document(0).unwrap();
        assert_eq!(session.selected, Some(1));
        assert_eq!(session.selected_document().unwrap().name, "c.jpg");

        // Removing the selected document falls back to the previous one
        session.remove_document(1).unwrap();
        assert_eq!(session.selected, Some(0));
        assert_eq!(session.form.first_name, "B");

        session.remove_document(0).unwrap();
        assert_eq!(session.selected, None);
        assert_eq!(session.form, FieldSet::default());

        assert!(session.remove_document(0).is_err());
    }

    #[test]
    fn test_clear_keeps_api_settings() {
        let mut session = ScanSession::default();
        session.api.endpoint_url = "http://localhost/api".to_string();
        session.add_document(document("a.jpg", "A"));

        session.clear();
        assert!(session.documents.is_empty());
        assert!(session.selected.is_none());
        assert!(session.api.is_configured());
    }

    #[test]
    fn test_store_isolates_chats() {
        let store = SessionStore::new(ApiConfig {
            endpoint_url: "http://default".to_string(),
            ..Default::default()
        });

        store.with_session(1, |s| {
            s.add_document(document("a.jpg", "A"));
        });
        assert_eq!(store.get(1).documents.len(), 1);
        assert!(store.get(2).documents.is_empty());
        assert_eq!(store.get(2).api.endpoint_url, "http://default");
        assert_eq!(store.session_count(), 2);

        store.reset(1);
        assert!(store.get(1).documents.is_empty());
    }

    #[test]
    fn test_default_headers() {
        let api = ApiConfig::default();
        assert_eq!(api.headers_json, DEFAULT_HEADERS_JSON);
        assert!(!api.is_configured());
    }
}
