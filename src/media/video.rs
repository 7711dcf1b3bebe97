//! Video understanding with an ordered fallback.
//!
//! The direct strategy hands the whole file to a multimodal model. When that
//! is unavailable or fails, the hybrid strategy transcribes the audio track,
//! samples frames and asks the text model to write the description from
//! whatever evidence it got.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::frames::FrameSampler;
use crate::ai::services::{
    CompletionRequest, CompletionService, TranscriptionService, VideoUnderstandingService,
};
use crate::core::models::MediaFrame;
use crate::errors::PipelineError;
use crate::prompt::{
    FRAMES_PRESENT_NOTE, NO_DESCRIPTION, VIDEO_MAX_TOKENS, video_direct_instruction,
    video_hybrid_prompt,
};

/// Frames sampled by the hybrid strategy when the caller supplied none.
pub const HYBRID_FRAME_COUNT: usize = 5;

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Upload name for the audio track; the speech service rejects `.mov` and
/// `.mkv` names.
pub const TRANSCRIPTION_FILE_NAME: &str = "video.mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStrategy {
    Direct,
    Hybrid,
}

const STRATEGY_ORDER: [VideoStrategy; 2] = [VideoStrategy::Direct, VideoStrategy::Hybrid];

pub struct VideoUnderstandingChain {
    direct: Option<Arc<dyn VideoUnderstandingService>>,
    transcriber: Arc<dyn TranscriptionService>,
    completion: Arc<dyn CompletionService>,
    sampler: Arc<dyn FrameSampler>,
    language: String,
}

impl VideoUnderstandingChain {
    #[must_use]
    pub fn new(
        direct: Option<Arc<dyn VideoUnderstandingService>>,
        transcriber: Arc<dyn TranscriptionService>,
        completion: Arc<dyn CompletionService>,
        sampler: Arc<dyn FrameSampler>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            direct,
            transcriber,
            completion,
            sampler,
            language: language.into(),
        }
    }

    /// Describe the video at `video_path`. Never fails: when every strategy
    /// errors, the last error is rendered as the description.
    pub async fn describe(
        &self,
        video_path: &Path,
        user_caption: &str,
        supplied_frames: &[MediaFrame],
    ) -> String {
        let mut last_failure = None;

        for strategy in STRATEGY_ORDER {
            let attempt = match strategy {
                VideoStrategy::Direct => self.direct(video_path, user_caption).await,
                VideoStrategy::Hybrid => {
                    self.hybrid(video_path, user_caption, supplied_frames).await
                }
            };
            match attempt {
                Ok(text) => {
                    info!(
                        "Video {} described by {:?} strategy ({} characters)",
                        video_path.display(),
                        strategy,
                        text.chars().count()
                    );
                    return text;
                }
                Err(e) => {
                    warn!(
                        "{:?} video strategy failed for {}: {}",
                        strategy,
                        video_path.display(),
                        e
                    );
                    last_failure = Some(e);
                }
            }
        }

        let detail = last_failure.map_or_else(|| "no strategy ran".to_string(), |e| e.to_string());
        error!("Video analysis failed for {}: {}", video_path.display(), detail);
        format!("Video analysis failed: {detail}")
    }

    async fn direct(&self, video_path: &Path, user_caption: &str) -> Result<String, PipelineError> {
        let service = self.direct.as_ref().ok_or_else(|| {
            PipelineError::Service("direct video understanding is not configured".to_string())
        })?;

        let video = tokio::fs::read(video_path).await?;
        let mime = mime_guess::from_path(video_path)
            .first()
            .map_or_else(|| DEFAULT_VIDEO_MIME.to_string(), |m| m.to_string());
        let instruction = video_direct_instruction(&self.language, user_caption);

        service.understand_video(video, &mime, &instruction).await
    }

    async fn hybrid(
        &self,
        video_path: &Path,
        user_caption: &str,
        supplied_frames: &[MediaFrame],
    ) -> Result<String, PipelineError> {
        info!("Using hybrid video analysis (transcript + frames)");

        let transcript = self.transcribe_best_effort(video_path).await;

        let has_frames = if supplied_frames.is_empty() {
            let sampler = Arc::clone(&self.sampler);
            let path: PathBuf = video_path.to_path_buf();
            tokio::task::spawn_blocking(move || sampler.sample(&path, HYBRID_FRAME_COUNT))
                .await
                .map(|frames| !frames.is_empty())
                .unwrap_or_else(|e| {
                    warn!("Frame sampling task failed: {}", e);
                    false
                })
        } else {
            true
        };

        let mut evidence = Vec::new();
        if has_frames {
            evidence.push(FRAMES_PRESENT_NOTE.to_string());
        }
        if !transcript.is_empty() {
            evidence.push(format!("Speech/sound transcript: {transcript}"));
        }
        if evidence.is_empty() {
            return Ok(NO_DESCRIPTION.to_string());
        }

        let prompt = video_hybrid_prompt(&self.language, user_caption, &evidence);
        self.completion
            .complete(CompletionRequest::analysis(prompt, VIDEO_MAX_TOKENS))
            .await
    }

    async fn transcribe_best_effort(&self, video_path: &Path) -> String {
        let audio = match tokio::fs::read(video_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not read {} for transcription: {}", video_path.display(), e);
                return String::new();
            }
        };

        match self.transcriber.transcribe(TRANSCRIPTION_FILE_NAME, audio).await {
            Ok(text) => {
                info!("Transcript received: {} characters", text.chars().count());
                text.trim().to_string()
            }
            Err(e) => {
                warn!("Could not transcribe {}: {}", video_path.display(), e);
                String::new()
            }
        }
    }
}
