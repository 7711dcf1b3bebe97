//! Modality normalizers.
//!
//! Each inbound event is turned into exactly one [`NormalizedInput`], or is
//! rejected after a notice was sent to the chat. Failures of sub-steps
//! (link extraction, image description, document analysis, video analysis)
//! degrade the text instead of stopping the event.

mod audio;
mod document;
mod photo;
mod poll;
mod text;
mod video;

use std::sync::Arc;
use tracing::{info, warn};

use crate::ai::services::{CompletionService, TranscriptionService, VisionService};
use crate::core::models::{ConversationId, InboundEvent, NormalizedInput, Payload};
use crate::extract::web::ExtractionChain;
use crate::media::frames::FrameSampler;
use crate::media::video::VideoUnderstandingChain;
use crate::prompt::url_failure_notice;
use crate::transport::ChatTransport;
use crate::utils::links::first_link;

pub use video::MAX_DOWNLOAD_BYTES;

/// Outcome of normalizing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Ready(NormalizedInput),
    /// The user was told why; nothing goes on to summarization.
    Rejected,
}

/// External collaborators the normalizers call into.
pub struct NormalizerDeps {
    pub transport: Arc<dyn ChatTransport>,
    pub web: ExtractionChain,
    pub vision: Arc<dyn VisionService>,
    pub transcriber: Arc<dyn TranscriptionService>,
    pub completion: Arc<dyn CompletionService>,
    pub video: VideoUnderstandingChain,
    pub sampler: Arc<dyn FrameSampler>,
    pub language: String,
}

pub struct Normalizer {
    deps: NormalizerDeps,
}

impl Normalizer {
    #[must_use]
    pub fn new(deps: NormalizerDeps) -> Self {
        Self { deps }
    }

    pub async fn normalize(&self, event: &InboundEvent) -> Normalized {
        info!(
            "Normalizing {} message in chat {}",
            event.payload.modality(),
            event.chat_id
        );
        match &event.payload {
            Payload::Text(text) => Normalized::Ready(self.text(event.chat_id, text).await),
            Payload::Photo(sizes) => Normalized::Ready(self.photo(event, sizes).await),
            Payload::Document(file) => self.document(event, file).await,
            Payload::Video(file) => self.video(event, file).await,
            Payload::Voice(file) | Payload::Audio(file) => self.audio(event, file).await,
            Payload::Poll { question } => Normalized::Ready(poll::normalize_poll(question)),
        }
    }

    /// `text` followed by the text of the first page it links to.
    ///
    /// If extraction fails the user is told once and `text` comes back as is.
    async fn with_linked_page(&self, chat_id: ConversationId, text: &str) -> String {
        let Some(url) = first_link(text) else {
            return text.to_string();
        };
        info!("Extracting text from {}", url);

        match self.deps.web.extract(&url).await {
            Ok(page) if page.trim().is_empty() => text.to_string(),
            Ok(page) => {
                info!("Extracted {} characters from {}", page.chars().count(), url);
                format!("{text}\n\n{page}")
            }
            Err(e) => {
                warn!("Link extraction failed for {}: {}", url, e);
                self.notify(chat_id, &url_failure_notice(&e.to_string()), None)
                    .await;
                text.to_string()
            }
        }
    }

    /// Best-effort message to the chat; a failed notice never stops processing.
    async fn notify(&self, chat_id: ConversationId, text: &str, reply_to: Option<i64>) {
        if let Err(e) = self.deps.transport.send_text(chat_id, text, reply_to).await {
            warn!("Failed to send notice to chat {}: {}", chat_id, e);
        }
    }
}
