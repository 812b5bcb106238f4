//! # Field Extraction Module
//!
//! Pulls the five identity fields out of raw OCR text. Each field has a short,
//! ordered list of case-sensitive label patterns; the first pattern that matches
//! wins and its first capture group becomes the value. Fields are extracted
//! independently of each other and a field with no match is an empty string.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

lazy_static! {
    // Labelled names run to the end of the line and may span several words.
    // A bare "Name:" line splits into its first word and the remaining words.
    static ref FIRST_NAME_PATTERNS: Vec<Regex> = compile_patterns(&[
        r"First Name:[ \t]*([\p{L}'\-]+(?:[ \t]+[\p{L}'\-]+)*)",
        r"Given Name:[ \t]*([\p{L}'\-]+(?:[ \t]+[\p{L}'\-]+)*)",
        r"(?m)^[ \t]*Name:[ \t]*([\p{L}'\-]+)",
    ]);
    static ref LAST_NAME_PATTERNS: Vec<Regex> = compile_patterns(&[
        r"Last Name:[ \t]*([\p{L}'\-]+(?:[ \t]+[\p{L}'\-]+)*)",
        r"Surname:[ \t]*([\p{L}'\-]+(?:[ \t]+[\p{L}'\-]+)*)",
        r"(?m)^[ \t]*Name:[ \t]*[\p{L}'\-]+[ \t]+([\p{L}'\-]+(?:[ \t]+[\p{L}'\-]+)*)",
    ]);
    static ref DOB_PATTERNS: Vec<Regex> = compile_patterns(&[
        r"DOB:[ \t]*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})",
        r"Date of Birth:[ \t]*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})",
        r"Born:[ \t]*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})",
    ]);
    static ref PLACE_OF_BIRTH_PATTERNS: Vec<Regex> = compile_patterns(&[
        r"Place of Birth:[ \t]*([^\r\n]*\S)",
        r"POB:[ \t]*([^\r\n]*\S)",
        r"Birthplace:[ \t]*([^\r\n]*\S)",
    ]);
    static ref ID_NUMBER_PATTERNS: Vec<Regex> = compile_patterns(&[
        r"ID No\.?:[ \t]*([A-Z0-9\-]+)",
        r"ID Number:[ \t]*([A-Z0-9\-]+)",
        r"Document No\.?:[ \t]*([A-Z0-9\-]+)",
    ]);
}

fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("Invalid field extraction regex pattern"))
        .collect()
}

/// Returns capture group 1 of the first pattern that matches, or an empty string
fn first_match(patterns: &[Regex], text: &str) -> String {
    patterns
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Identifies one of the five form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    FirstName,
    LastName,
    DateOfBirth,
    PlaceOfBirth,
    IdNumber,
}

impl FieldKey {
    /// All fields in form order
    pub const ALL: [FieldKey; 5] = [
        FieldKey::FirstName,
        FieldKey::LastName,
        FieldKey::DateOfBirth,
        FieldKey::PlaceOfBirth,
        FieldKey::IdNumber,
    ];

    /// JSON key used in the submission body and in callback data
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::FirstName => "first_name",
            FieldKey::LastName => "last_name",
            FieldKey::DateOfBirth => "date_of_birth",
            FieldKey::PlaceOfBirth => "place_of_birth",
            FieldKey::IdNumber => "id_number",
        }
    }

    /// Localization key of the human-readable label
    pub fn label_key(&self) -> &'static str {
        match self {
            FieldKey::FirstName => "field-first-name",
            FieldKey::LastName => "field-last-name",
            FieldKey::DateOfBirth => "field-date-of-birth",
            FieldKey::PlaceOfBirth => "field-place-of-birth",
            FieldKey::IdNumber => "field-id-number",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

/// The five identity fields shown in the form and submitted to the API.
///
/// Serializes to exactly
/// `{"first_name", "last_name", "date_of_birth", "place_of_birth", "id_number"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub id_number: String,
}

impl FieldSet {
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::FirstName => &self.first_name,
            FieldKey::LastName => &self.last_name,
            FieldKey::DateOfBirth => &self.date_of_birth,
            FieldKey::PlaceOfBirth => &self.place_of_birth,
            FieldKey::IdNumber => &self.id_number,
        }
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            FieldKey::FirstName => self.first_name = value,
            FieldKey::LastName => self.last_name = value,
            FieldKey::DateOfBirth => self.date_of_birth = value,
            FieldKey::PlaceOfBirth => self.place_of_birth = value,
            FieldKey::IdNumber => self.id_number = value,
        }
    }

    /// True when every field is empty
    pub fn is_empty(&self) -> bool {
        FieldKey::ALL.iter().all(|key| self.get(*key).trim().is_empty())
    }

    /// Fields whose value is empty after trimming
    pub fn missing_fields(&self) -> Vec<FieldKey> {
        FieldKey::ALL
            .iter()
            .copied()
            .filter(|key| self.get(*key).trim().is_empty())
            .collect()
    }

    /// Number of non-empty fields
    pub fn filled_count(&self) -> usize {
        FieldKey::ALL.len() - self.missing_fields().len()
    }
}

pub fn extract_first_name(text: &str) -> String {
    first_match(&FIRST_NAME_PATTERNS, text)
}

pub fn extract_last_name(text: &str) -> String {
    first_match(&LAST_NAME_PATTERNS, text)
}

/// Date of birth as written on the document (no normalization)
pub fn extract_dob(text: &str) -> String {
    first_match(&DOB_PATTERNS, text)
}

pub fn extract_place_of_birth(text: &str) -> String {
    first_match(&PLACE_OF_BIRTH_PATTERNS, text).trim().to_string()
}

pub fn extract_id_number(text: &str) -> String {
    first_match(&ID_NUMBER_PATTERNS, text)
}

/// Run every field extractor over the OCR text
pub fn extract_fields(text: &str) -> FieldSet {
    let fields = FieldSet {
        first_name: extract_first_name(text),
        last_name: extract_last_name(text),
        date_of_birth: extract_dob(text),
        place_of_birth: extract_place_of_birth(text),
        id_number: extract_id_number(text),
    };

    debug!(
        text_length = text.len(),
        fields_found = fields.filled_count(),
        "Field extraction completed"
    );

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CARD: &str = "REPUBLIC OF EXAMPLE\nIDENTITY CARD\nFirst Name: John\nLast Name: Doe\nDOB: 01/01/1990\nPlace of Birth:  Springfield  \nID No: AB-123456\n";

    #[test]
    fn test_extract_dob_from_label() {
        assert_eq!(extract_dob("DOB: 01/01/1990"), "01/01/1990");
        assert_eq!(extract_dob("some header\nDOB: 01/01/1990 more"), "01/01/1990");
    }

    #[test]
    fn test_extract_dob_fallback_patterns() {
        assert_eq!(extract_dob("Date of Birth: 12.05.1985"), "12.05.1985");
        assert_eq!(extract_dob("Born: 3-7-99"), "3-7-99");
    }

    #[test]
    fn test_no_labels_returns_empty_strings() {
        let text = "This text has no identity labels at all";
        assert_eq!(extract_first_name(text), "");
        assert_eq!(extract_last_name(text), "");
        assert_eq!(extract_dob(text), "");
        assert_eq!(extract_place_of_birth(text), "");
        assert_eq!(extract_id_number(text), "");
        assert!(extract_fields(text).is_empty());
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert_eq!(extract_dob("dob: 01/01/1990"), "");
        assert_eq!(extract_first_name("first name: John"), "");
        assert_eq!(extract_id_number("id no: AB123"), "");
    }

    #[test]
    fn test_extract_fields_from_sample_card() {
        let fields = extract_fields(SAMPLE_CARD);
        assert_eq!(fields.first_name, "John");
        assert_eq!(fields.last_name, "Doe");
        assert_eq!(fields.date_of_birth, "01/01/1990");
        assert_eq!(fields.place_of_birth, "Springfield");
        assert_eq!(fields.id_number, "AB-123456");
        assert!(fields.missing_fields().is_empty());
    }

    #[test]
    fn test_combined_name_line() {
        let text = "Name: Marie Curie\nDOB: 07/11/1867";
        assert_eq!(extract_first_name(text), "Marie");
        assert_eq!(extract_last_name(text), "Curie");
    }

    #[test]
    fn test_first_pattern_wins() {
        let text = "Given Name: Alice\nFirst Name: Bob";
        assert_eq!(extract_first_name(text), "Bob");

        let text = "Surname: Smith\nLast Name: Jones";
        assert_eq!(extract_last_name(text), "Jones");
    }

    #[test]
    fn test_name_label_inside_other_label_is_ignored() {
        // Only "First Name" is present; the generic "Name:" pattern is line-anchored
        let text = "First Name: John Paul";
        assert_eq!(extract_first_name(text), "John Paul");
        assert_eq!(extract_last_name(text), "");
    }

    #[test]
    fn test_multi_word_labelled_names() {
        assert_eq!(extract_last_name("Surname: Van Der Berg\nDOB: 1/2/80"), "Van Der Berg");
        assert_eq!(extract_first_name("First Name: Mary Ann  \nLast Name: Lee"), "Mary Ann");
        assert_eq!(extract_last_name("First Name: Mary Ann\nLast Name: O'Brien-Smith"), "O'Brien-Smith");
    }

    #[test]
    fn test_generic_name_line_splits_first_word_from_rest() {
        assert_eq!(extract_first_name("Name: Madonna"), "Madonna");
        assert_eq!(extract_last_name("Name: Madonna"), "");

        let text = "Name: Jean Paul Sartre\nBorn: 21/06/1905";
        assert_eq!(extract_first_name(text), "Jean");
        assert_eq!(extract_last_name(text), "Paul Sartre");
    }

    #[test]
    fn test_place_of_birth_is_trimmed() {
        assert_eq!(extract_place_of_birth("POB:   Lyon, France   \nnext"), "Lyon, France");
        assert_eq!(extract_place_of_birth("Birthplace: Oslo"), "Oslo");
        assert_eq!(extract_place_of_birth("Place of Birth:   \nID No: X1"), "");
    }

    #[test]
    fn test_id_number_variants() {
        assert_eq!(extract_id_number("ID No.: X99-0001"), "X99-0001");
        assert_eq!(extract_id_number("ID Number: 123456789"), "123456789");
        assert_eq!(extract_id_number("Document No: P1234567"), "P1234567");
    }

    #[test]
    fn test_field_key_round_trip_names() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>(), Ok(key));
        }
        assert!("middle_name".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_field_set_serializes_to_expected_keys() {
        let mut fields = FieldSet::default();
        fields.set(FieldKey::FirstName, "John");
        fields.set(FieldKey::LastName, "Doe");

        let value = serde_json::to_value(&fields).expect("FieldSet serializes");
        assert_eq!(
            value,
            serde_json::json!({
                "first_name": "John",
                "last_name": "Doe",
                "date_of_birth": "",
                "place_of_birth": "",
                "id_number": ""
            })
        );
        assert_eq!(fields.filled_count(), 2);
        assert_eq!(
            fields.missing_fields(),
            vec![FieldKey::DateOfBirth, FieldKey::PlaceOfBirth, FieldKey::IdNumber]
        );
    }
}
