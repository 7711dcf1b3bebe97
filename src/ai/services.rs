//! Seams between the pipeline and the AI services it consumes.
//!
//! Each trait covers one external capability so that strategies can be
//! composed (and faked in tests) independently of the provider behind them.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

use crate::errors::PipelineError;

/// Which configured model a completion should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// The conversational model that writes replies.
    Summary,
    /// The model used for document and video analysis sub-steps.
    Analysis,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatCompletionMessage>,
    pub max_tokens: Option<u32>,
    pub tier: ModelTier,
}

impl CompletionRequest {
    /// Single user message on the analysis model.
    #[must_use]
    pub fn analysis(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            messages: vec![text_message(MessageRole::user, prompt)],
            max_tokens: Some(max_tokens),
            tier: ModelTier::Analysis,
        }
    }
}

#[must_use]
pub fn text_message(role: MessageRole, text: impl Into<String>) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Content::Text(text.into()),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the service call fails or yields no text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, PipelineError>;
}

#[async_trait]
pub trait VisionService: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the service call fails or yields no text.
    async fn describe_image(
        &self,
        image_url: &str,
        instruction: &str,
        max_tokens: u32,
    ) -> Result<String, PipelineError>;
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the upload or the transcription fails.
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<String, PipelineError>;
}

#[async_trait]
pub trait VideoUnderstandingService: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the payload is refused or the service fails.
    async fn understand_video(
        &self,
        video: Vec<u8>,
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, PipelineError>;
}
