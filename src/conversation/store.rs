use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

use crate::core::models::{ConversationId, Turn};

/// Ordered turns of one conversation. Grows without bound.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

pub type SharedConversation = Arc<AsyncMutex<ConversationState>>;

/// All conversations the process has seen.
///
/// The outer lock only guards the map. Each conversation has its own async
/// lock so that appends to one conversation are serialized while others
/// proceed.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<ConversationId, SharedConversation>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation for `id`, created empty on first use.
    pub fn conversation(&self, id: ConversationId) -> SharedConversation {
        let mut map = self
            .conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(id).or_default())
    }

    pub async fn append(&self, id: ConversationId, turn: Turn) {
        self.conversation(id).lock().await.push(turn);
    }

    /// A copy of the turns recorded so far; empty for unknown conversations.
    pub async fn transcript(&self, id: ConversationId) -> Vec<Turn> {
        let existing = self
            .conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        match existing {
            Some(conversation) => conversation.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
