//! # Dialogue Tests
//!
//! Exercises the per-chat input state through teloxide's in-memory storage.

use id_scanner::dialogue::{ScanDialogue, ScanDialogueState};
use id_scanner::field_extraction::FieldKey;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_chat_has_no_state() {
        let storage = InMemStorage::<ScanDialogueState>::new();
        let dialogue = ScanDialogue::new(storage, ChatId(100));

        let state = dialogue.get().await.unwrap();
        assert!(state.is_none());
        assert_eq!(
            dialogue.get_or_default().await.unwrap(),
            ScanDialogueState::Start
        );
    }

    #[tokio::test]
    async fn test_field_edit_state_round_trip() {
        let storage = InMemStorage::<ScanDialogueState>::new();
        let dialogue = ScanDialogue::new(storage, ChatId(100));

        let editing = ScanDialogueState::EditingField {
            field: FieldKey::IdNumber,
            form_message_id: Some(17),
        };
        dialogue.update(editing.clone()).await.unwrap();
        assert_eq!(dialogue.get().await.unwrap(), Some(editing));

        dialogue.exit().await.unwrap();
        assert!(dialogue.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_states_are_kept_per_chat() {
        let storage = InMemStorage::<ScanDialogueState>::new();
        let first = ScanDialogue::new(storage.clone(), ChatId(1));
        let second = ScanDialogue::new(storage, ChatId(2));

        first.update(ScanDialogueState::AwaitingEndpoint).await.unwrap();
        second.update(ScanDialogueState::AwaitingApiKey).await.unwrap();

        assert_eq!(
            first.get().await.unwrap(),
            Some(ScanDialogueState::AwaitingEndpoint)
        );
        assert_eq!(
            second.get().await.unwrap(),
            Some(ScanDialogueState::AwaitingApiKey)
        );

        // A later prompt replaces the pending one
        first.update(ScanDialogueState::AwaitingHeaders).await.unwrap();
        assert_eq!(
            first.get().await.unwrap(),
            Some(ScanDialogueState::AwaitingHeaders)
        );
        assert!(first.get_or_default().await.unwrap().expects_text());
    }
}
