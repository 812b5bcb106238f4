//! Dialogue module tracking what the bot expects the user to type next.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::field_extraction::FieldKey;

/// Conversation state for one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ScanDialogueState {
    /// Waiting for a photo, a document or a command
    #[default]
    Start,
    /// The next text message is the new value of `field`
    EditingField {
        field: FieldKey,
        form_message_id: Option<i32>, // form message to refresh after the edit
    },
    AwaitingEndpoint,
    AwaitingApiKey,
    AwaitingHeaders,
}

impl ScanDialogueState {
    /// True when the next plain text message is consumed as input
    pub fn expects_text(&self) -> bool {
        !matches!(self, ScanDialogueState::Start)
    }
}

/// Type alias for the scan dialogue
pub type ScanDialogue = Dialogue<ScanDialogueState, InMemStorage<ScanDialogueState>>;
