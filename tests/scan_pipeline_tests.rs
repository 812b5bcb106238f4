//! # Scan Pipeline Tests
//!
//! Runs uploaded bytes through validation, decoding and preprocessing, then
//! drives the session the way the bot does after OCR. Tesseract itself is not
//! invoked so these tests run without language data installed.


use id_scanner::field_extraction::{extract_fields, FieldKey};
use id_scanner::ocr::{validate_image_bytes, OcrConfig};
use id_scanner::preprocessing::{decode_image, encode_png, preprocess_for_ocr, PipelineParams};
use id_scanner::session::{Document, SessionStore};
use test_helpers::synthetic_card_png;

const CARD_TEXT: &str = "IDENTITY CARD\nFirst Name: Marie\nLast Name: Curie\nDate of Birth: 07.11.1867\nPlace of Birth: Warsaw\nID Number: PL-1867\n";
const PASSPORT_TEXT: &str = "PASSPORT\nGiven Name: Pierre\nSurname: Curie\nBorn: 15/05/1859\nPOB: Paris\nDocument No: FR-59\n";

fn scanned(name: &str, text: &str) -> Document {
    Document::new(
        name,
        synthetic_card_png(60, 40),
        Vec::new(),
        text,
        extract_fields(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_upload_is_accepted_and_binarized() {
        let bytes = synthetic_card_png(80, 48);
        let format = validate_image_bytes(&bytes, &OcrConfig::default()).unwrap();
        assert_eq!(format, image::ImageFormat::Png);

        let decoded = decode_image(&bytes).unwrap();
        let prepared = preprocess_for_ocr(&decoded).unwrap();

        assert_eq!(prepared.original_dimensions, (80, 48));
        assert_eq!(prepared.image.dimensions(), (80, 48));
        assert_eq!(prepared.params, PipelineParams::FIXED);
        assert!(prepared.image.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Flat background stays white, ink edges turn black
        assert_eq!(prepared.image.get_pixel(0, 0)[0], 255);
        assert!(prepared.image.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn test_preprocessed_image_encodes_as_png() {
        let decoded = decode_image(&synthetic_card_png(32, 32)).unwrap();
        let prepared = preprocess_for_ocr(&decoded).unwrap();
        let png = encode_png(&prepared.image).unwrap();

        assert_eq!(
            validate_image_bytes(&png, &OcrConfig::default()).unwrap(),
            image::ImageFormat::Png
        );
        let reloaded = decode_image(&png).unwrap().to_luma8();
        assert_eq!(reloaded, prepared.image);
    }

    #[test]
    fn test_text_upload_is_rejected() {
        let bytes = b"First Name: not an image at all".to_vec();
        assert!(validate_image_bytes(&bytes, &OcrConfig::default()).is_err());
        assert!(decode_image(&bytes).is_err());
    }

    #[test]
    fn test_oversized_upload_is_rejected() {
        let config = OcrConfig {
            max_file_size: 64,
            ..Default::default()
        };
        let bytes = synthetic_card_png(200, 200);
        assert!(bytes.len() > 64);
        assert!(validate_image_bytes(&bytes, &config).is_err());
    }

    #[test]
    fn test_session_flow_across_two_documents() {
        let store = SessionStore::default();
        let chat_id = 7;

        store.with_session(chat_id, |session| {
            session.add_document(scanned("card.jpg", CARD_TEXT));
            assert_eq!(session.form.first_name, "Marie");
            assert_eq!(session.form.id_number, "PL-1867");

            session.add_document(scanned("passport.jpg", PASSPORT_TEXT));
            assert_eq!(session.selected, Some(1));
            assert_eq!(session.form.first_name, "Pierre");
            assert_eq!(session.form.place_of_birth, "Paris");
        });

        // Edits stay on the form and never touch the document
        store.with_session(chat_id, |session| {
            session.update_field(FieldKey::PlaceOfBirth, "  Paris 5e ");
            assert_eq!(session.form.place_of_birth, "Paris 5e");
            assert!(session.form_edited);
            assert_eq!(session.documents[1].extracted.place_of_birth, "Paris");
        });

        // Selecting another document discards the edits
        store.with_session(chat_id, |session| {
            let doc = session.select(0).unwrap();
            assert_eq!(doc.name, "card.jpg");
            assert_eq!(session.form.last_name, "Curie");
            assert_eq!(session.form.date_of_birth, "07.11.1867");
            assert!(!session.form_edited);
        });

        // Removing the selected document falls back to the remaining one
        store.with_session(chat_id, |session| {
            session.remove_document(0).unwrap();
            assert_eq!(session.documents.len(), 1);
            assert_eq!(session.selected, Some(0));
            assert_eq!(session.form.first_name, "Pierre");
            assert!(session.select(3).is_err());
        });

        store.reset(chat_id);
        assert!(store.get(chat_id).documents.is_empty());
    }

    #[test]
    fn test_sessions_are_isolated_per_chat() {
        let store = SessionStore::default();
        store.with_session(1, |session| {
            session.add_document(scanned("card.jpg", CARD_TEXT));
        });

        assert_eq!(store.get(1).documents.len(), 1);
        assert!(store.get(2).documents.is_empty());
        assert_eq!(store.session_count(), 2);
    }
}
