use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use super::{Normalized, Normalizer};
use crate::core::models::{FileRef, InboundEvent, MediaFrame, Modality, NormalizedInput};
use crate::errors::PipelineError;
use crate::media::video::HYBRID_FRAME_COUNT;
use crate::prompt::{MAX_CAPTION_CHARS, clip_chars, size_exceeded_notice};

/// Largest payload the bot API lets us download.
pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

const VIDEO_PLACEHOLDER: &str = "Video without caption";
const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".mov", ".mkv", ".webm"];

/// Documents that clients upload as files but are really videos.
#[must_use]
pub fn is_video_document(file: &FileRef) -> bool {
    let by_mime = file
        .mime_type
        .as_deref()
        .is_some_and(|m| m.to_ascii_lowercase().starts_with("video/"));
    let by_name = file.file_name.as_deref().is_some_and(|name| {
        let name = name.to_ascii_lowercase();
        VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    });
    by_mime || by_name
}

fn temp_suffix(file: &FileRef) -> String {
    file.file_name
        .as_deref()
        .and_then(|n| Path::new(n).extension())
        .map_or_else(|| ".mp4".to_string(), |ext| format!(".{}", ext.to_string_lossy()))
}

impl Normalizer {
    /// Video messages: caption plus the video chain's description.
    pub async fn video(&self, event: &InboundEvent, file: &FileRef) -> Normalized {
        if !self.within_size_limit(event, file.file_size).await {
            return Normalized::Rejected;
        }

        let caption = event.caption_text().unwrap_or(VIDEO_PLACEHOLDER);
        let mut body = self.with_linked_page(event.chat_id, caption).await;

        match self.download_to_temp(event, file).await {
            Ok(Some(video)) => {
                let analysis = self.deps.video.describe(video.path(), &body, &[]).await;
                body.push_str(&format!("\n\nVideo analysis:\n{analysis}"));
                remove_temp(video);
            }
            Ok(None) => return Normalized::Rejected,
            Err(e) => {
                error!("Video processing failed in chat {}: {}", event.chat_id, e);
                body.push_str(&format!("\nVideo processing error: {e}"));
            }
        }

        Normalized::Ready(NormalizedInput::new(body, Modality::Video))
    }

    /// Video uploaded as a document. The first sampled frame goes back to the
    /// chat together with the analysis.
    pub(super) async fn video_document(&self, event: &InboundEvent, file: &FileRef) -> Normalized {
        let caption = event.caption_text().unwrap_or(super::document::DOCUMENT_PLACEHOLDER);
        let mut body = caption.to_string();

        if !self.within_size_limit(event, file.file_size).await {
            return Normalized::Rejected;
        }

        match self.download_to_temp(event, file).await {
            Ok(Some(video)) => {
                let frames = self.sample_frames(video.path()).await;
                let analysis = self.deps.video.describe(video.path(), &body, &frames).await;
                remove_temp(video);

                if let Some(first) = frames.into_iter().next() {
                    let photo_caption = clip_chars(&analysis, MAX_CAPTION_CHARS);
                    if let Err(e) = self
                        .deps
                        .transport
                        .send_photo(event.chat_id, first.jpeg, &photo_caption)
                        .await
                    {
                        warn!("Could not send first frame to chat {}: {}", event.chat_id, e);
                    }
                }
                body.push_str(&format!("\n\nVideo analysis (document):\n{analysis}"));
            }
            Ok(None) => return Normalized::Rejected,
            Err(e) => {
                error!("Video document processing failed in chat {}: {}", event.chat_id, e);
                body.push_str(&format!("\nVideo processing error: {e}"));
            }
        }

        Normalized::Ready(NormalizedInput::new(body, Modality::Document))
    }

    /// Rejects (with a notice) payloads declared larger than the download ceiling.
    pub(super) async fn within_size_limit(&self, event: &InboundEvent, size: Option<u64>) -> bool {
        match size {
            Some(size) if size > MAX_DOWNLOAD_BYTES => {
                warn!(
                    "Rejecting {} byte payload in chat {}: over download limit",
                    size, event.chat_id
                );
                self.notify(event.chat_id, &size_exceeded_notice(size), None)
                    .await;
                false
            }
            _ => true,
        }
    }

    /// Download into a temp file that is removed when dropped.
    ///
    /// `Ok(None)` means the payload turned out to be over the limit after all
    /// and the user was told.
    async fn download_to_temp(
        &self,
        event: &InboundEvent,
        file: &FileRef,
    ) -> Result<Option<NamedTempFile>, PipelineError> {
        let bytes = self.deps.transport.download(&file.file_id).await?;
        let size = bytes.len() as u64;
        if !self.within_size_limit(event, Some(size)).await {
            return Ok(None);
        }

        let suffix = temp_suffix(file);
        let video = tokio::task::spawn_blocking(move || -> Result<NamedTempFile, PipelineError> {
            let mut temp = tempfile::Builder::new()
                .prefix("retell-")
                .suffix(&suffix)
                .tempfile()?;
            temp.write_all(&bytes)?;
            temp.flush()?;
            Ok(temp)
        })
        .await
        .map_err(|e| PipelineError::Io(format!("temp file task failed: {e}")))??;

        info!("Downloaded {} bytes to {}", size, video.path().display());
        Ok(Some(video))
    }

    async fn sample_frames(&self, path: &Path) -> Vec<MediaFrame> {
        let sampler = Arc::clone(&self.deps.sampler);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || sampler.sample(&path, HYBRID_FRAME_COUNT))
            .await
            .unwrap_or_else(|e| {
                warn!("Frame sampling task failed: {}", e);
                Vec::new()
            })
    }
}

fn remove_temp(video: NamedTempFile) {
    let path = video.path().to_path_buf();
    if let Err(e) = video.close() {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}
