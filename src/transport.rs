//! The messaging platform as seen by the pipeline.

use async_trait::async_trait;

use crate::core::models::ConversationId;
use crate::errors::PipelineError;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// A URL from which the file can be fetched without further credentials
    /// exchange (used for vision calls).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot resolve the file.
    async fn file_url(&self, file_id: &str) -> Result<String, PipelineError>;

    /// # Errors
    ///
    /// Returns an error if resolving or downloading the file fails.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, PipelineError>;

    /// # Errors
    ///
    /// Returns an error if the platform rejects the message.
    async fn send_text(
        &self,
        chat_id: ConversationId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), PipelineError>;

    /// # Errors
    ///
    /// Returns an error if the platform rejects the upload.
    async fn send_photo(
        &self,
        chat_id: ConversationId,
        jpeg: Vec<u8>,
        caption: &str,
    ) -> Result<(), PipelineError>;
}
