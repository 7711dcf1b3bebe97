use tracing::{error, info};

use super::{Normalized, Normalizer};
use crate::core::models::{FileRef, InboundEvent, Modality, NormalizedInput, Payload};
use crate::errors::PipelineError;
use crate::prompt::TRANSCRIPTION_FAILED_NOTICE;

impl Normalizer {
    /// Voice notes and audio files: caption (with linked page) plus transcript.
    ///
    /// A failed transcription stops the event; there is nothing useful to
    /// summarize without it.
    pub async fn audio(&self, event: &InboundEvent, file: &FileRef) -> Normalized {
        let (modality, default_name) = match event.payload {
            Payload::Voice(_) => (Modality::Voice, "voice.ogg"),
            _ => (Modality::Audio, "audio.mp3"),
        };

        if !self.within_size_limit(event, file.file_size).await {
            return Normalized::Rejected;
        }

        let transcript = match self.transcribe_file(file, default_name).await {
            Ok(text) => text,
            Err(e) => {
                error!("Transcription failed in chat {}: {}", event.chat_id, e);
                self.notify(event.chat_id, TRANSCRIPTION_FAILED_NOTICE, event.message_id)
                    .await;
                return Normalized::Rejected;
            }
        };

        let caption = event.caption_text().unwrap_or_default();
        let mut body = self.with_linked_page(event.chat_id, caption).await;
        body.push_str(&format!("\nAudio transcription: {transcript}"));

        Normalized::Ready(NormalizedInput::new(body, modality))
    }

    async fn transcribe_file(&self, file: &FileRef, default_name: &str) -> Result<String, PipelineError> {
        let audio = self.deps.transport.download(&file.file_id).await?;
        info!("Transcribing {} bytes of audio", audio.len());
        let name = file.file_name.as_deref().unwrap_or(default_name);
        self.deps.transcriber.transcribe(name, audio).await
    }
}
