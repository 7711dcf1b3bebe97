//! Per-conversation transcripts and the summarization step that reads them.

pub mod dispatcher;
pub mod store;

pub use dispatcher::{Reply, SummarizationDispatcher};
pub use store::{ConversationState, ConversationStore};
