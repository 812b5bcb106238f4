//! # Localization Tests
//!
//! Checks that both bundled languages carry the same messages and that the
//! labels and prompts the bot relies on resolve in each of them.

use id_scanner::field_extraction::FieldKey;
use id_scanner::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::BTreeSet;

const EN_SOURCE: &str = include_str!("../locales/en/main.ftl");
const FR_SOURCE: &str = include_str!("../locales/fr/main.ftl");

/// Message identifiers defined at the start of a line
fn message_keys(source: &str) -> BTreeSet<&str> {
    source
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_alphabetic()))
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_languages_define_the_same_keys() {
        let en = message_keys(EN_SOURCE);
        let fr = message_keys(FR_SOURCE);

        assert!(en.len() > 50, "only {} English keys found", en.len());
        let missing_in_fr: Vec<_> = en.difference(&fr).collect();
        let missing_in_en: Vec<_> = fr.difference(&en).collect();
        assert!(missing_in_fr.is_empty(), "missing in fr: {:?}", missing_in_fr);
        assert!(missing_in_en.is_empty(), "missing in en: {:?}", missing_in_en);
    }

    #[test]
    fn test_every_key_resolves_in_both_languages() {
        let manager = LocalizationManager::new().unwrap();
        for key in message_keys(EN_SOURCE) {
            for lang in ["en", "fr"] {
                let message = manager.get_message_in_language(key, lang, None);
                assert!(
                    !message.starts_with("Missing"),
                    "{} did not resolve in {}: {}",
                    key,
                    lang,
                    message
                );
            }
        }
    }

    #[test]
    fn test_field_labels_are_translated() {
        let manager = LocalizationManager::new().unwrap();
        for field in FieldKey::ALL {
            let en = t_lang(&manager, field.label_key(), Some("en"));
            let fr = t_lang(&manager, field.label_key(), Some("fr"));
            assert!(!en.is_empty());
            assert!(!en.contains("Missing translation"));
            assert!(!fr.contains("Missing translation"));
        }
        assert_ne!(
            t_lang(&manager, "field-date-of-birth", Some("en")),
            t_lang(&manager, "field-date-of-birth", Some("fr"))
        );
    }

    #[test]
    fn test_regional_codes_and_unknown_languages() {
        let manager = LocalizationManager::new().unwrap();
        assert_eq!(manager.detect_language(Some("fr-CA")), "fr");
        assert_eq!(manager.detect_language(Some("FR")), "fr");
        assert_eq!(manager.detect_language(Some("de")), "en");
        assert_eq!(manager.detect_language(None), "en");
    }

    #[test]
    fn test_arguments_are_substituted() {
        let manager = LocalizationManager::new().unwrap();
        let message = t_args_lang(
            &manager,
            "submit-success",
            &[("status", "201")],
            Some("en"),
        );
        assert!(message.contains("201"));

        let message = t_args_lang(
            &manager,
            "endpoint-set",
            &[("url", "https://api.example.com/ids")],
            Some("fr"),
        );
        assert!(message.contains("https://api.example.com/ids"));
    }

    #[test]
    fn test_unknown_key_is_reported() {
        let manager = LocalizationManager::new().unwrap();
        assert_eq!(
            manager.get_message_in_language("no-such-message", "en", None),
            "Missing translation: no-such-message"
        );
    }
}
