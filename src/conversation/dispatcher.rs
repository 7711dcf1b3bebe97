use openai_api_rs::v1::chat_completion::MessageRole;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::store::ConversationStore;
use crate::ai::services::{CompletionRequest, CompletionService, ModelTier, text_message};
use crate::audit::AuditLogger;
use crate::core::models::{ConversationId, NormalizedInput, Role, Turn};
use crate::prompt::{
    APOLOGY_MESSAGE, MAX_NORMALIZED_CHARS, system_instruction, truncate_with_marker,
};

/// What goes back to the chat for one summarized event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Summary(String),
    /// The completion failed; the user turn stays in the transcript.
    Apology,
}

impl Reply {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Summary(text) => text,
            Self::Apology => APOLOGY_MESSAGE,
        }
    }
}

pub struct SummarizationDispatcher {
    store: Arc<ConversationStore>,
    completion: Arc<dyn CompletionService>,
    audit: Arc<AuditLogger>,
    channel_name: String,
    language: String,
}

impl SummarizationDispatcher {
    #[must_use]
    pub fn new(
        store: Arc<ConversationStore>,
        completion: Arc<dyn CompletionService>,
        audit: Arc<AuditLogger>,
        channel_name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            completion,
            audit,
            channel_name: channel_name.into(),
            language: language.into(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Record `input` as a user turn, ask for a reply with the whole transcript
    /// as context, and record the reply.
    pub async fn respond(&self, chat: ConversationId, input: &NormalizedInput) -> Reply {
        let text = truncate_with_marker(&input.text, MAX_NORMALIZED_CHARS);
        info!(
            "Received {} message in chat {} ({} characters)",
            input.modality,
            chat,
            text.chars().count()
        );

        // Held across the completion so turns of one chat never interleave.
        let conversation = self.store.conversation(chat);
        let mut state = conversation.lock().await;
        state.push(Turn::user(text.clone()));

        let mut messages: Vec<_> = state
            .turns()
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => MessageRole::user,
                    Role::Assistant => MessageRole::assistant,
                };
                text_message(role, turn.content.clone())
            })
            .collect();
        messages.push(text_message(
            MessageRole::system,
            system_instruction(&self.channel_name, &self.language),
        ));
        messages.push(text_message(MessageRole::user, text.clone()));

        let request = CompletionRequest {
            messages,
            max_tokens: None,
            tier: ModelTier::Summary,
        };

        match self.completion.complete(request).await {
            Ok(summary) => {
                state.push(Turn::assistant(summary.clone()));
                drop(state);

                if let Err(e) = self.audit.record(chat, &text, input.modality, &summary) {
                    warn!("Failed to write audit record for chat {}: {}", chat, e);
                }
                Reply::Summary(summary)
            }
            Err(e) => {
                error!("Summarization failed for chat {}: {}", chat, e);
                Reply::Apology
            }
        }
    }
}
