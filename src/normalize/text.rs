use super::Normalizer;
use crate::core::models::{ConversationId, Modality, NormalizedInput};

impl Normalizer {
    /// Plain text, extended with the linked page's text when it has a URL.
    pub async fn text(&self, chat_id: ConversationId, text: &str) -> NormalizedInput {
        let body = self.with_linked_page(chat_id, text).await;
        NormalizedInput::new(body, Modality::Text)
    }
}
