//! Shared types for callback handlers

use std::fmt;

use crate::field_extraction::FieldKey;

/// Action encoded in an inline keyboard button's callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `edit_field:<key>`
    EditField(FieldKey),
    /// `submit`
    Submit,
    /// `reset_form`
    ResetForm,
    /// `documents`
    Documents,
    /// `select_doc:<index>`
    SelectDocument(usize),
    /// `remove_doc:<index>`
    RemoveDocument(usize),
}

impl CallbackAction {
    /// Parse callback data; unknown or malformed data yields `None`
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "submit" => return Some(CallbackAction::Submit),
            "reset_form" => return Some(CallbackAction::ResetForm),
            "documents" => return Some(CallbackAction::Documents),
            _ => {}
        }

        let (prefix, argument) = data.split_once(':')?;
        match prefix {
            "edit_field" => argument.parse().ok().map(CallbackAction::EditField),
            "select_doc" => argument.parse().ok().map(CallbackAction::SelectDocument),
            "remove_doc" => argument.parse().ok().map(CallbackAction::RemoveDocument),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::EditField(key) => write!(f, "edit_field:{}", key.as_str()),
            CallbackAction::Submit => write!(f, "submit"),
            CallbackAction::ResetForm => write!(f, "reset_form"),
            CallbackAction::Documents => write!(f, "documents"),
            CallbackAction::SelectDocument(index) => write!(f, "select_doc:{}", index),
            CallbackAction::RemoveDocument(index) => write!(f, "remove_doc:{}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(
            CallbackAction::parse("edit_field:date_of_birth"),
            Some(CallbackAction::EditField(FieldKey::DateOfBirth))
        );
        assert_eq!(CallbackAction::parse("submit"), Some(CallbackAction::Submit));
        assert_eq!(
            CallbackAction::parse("select_doc:3"),
            Some(CallbackAction::SelectDocument(3))
        );
        assert_eq!(
            CallbackAction::parse("remove_doc:0"),
            Some(CallbackAction::RemoveDocument(0))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_data() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("edit_field:nickname"), None);
        assert_eq!(CallbackAction::parse("select_doc:-1"), None);
        assert_eq!(CallbackAction::parse("select_doc"), None);
        assert_eq!(CallbackAction::parse("page:2"), None);
    }

    #[test]
    fn test_display_matches_parse() {
        for action in [
            CallbackAction::EditField(FieldKey::IdNumber),
            CallbackAction::ResetForm,
            CallbackAction::Documents,
            CallbackAction::SelectDocument(12),
        ] {
            assert_eq!(CallbackAction::parse(&action.to_string()), Some(action));
        }
    }
}
