#![allow(dead_code)]

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::Content;
use retell::ai::services::{
    CompletionRequest, CompletionService, TranscriptionService, VideoUnderstandingService,
    VisionService,
};
use retell::core::models::{ConversationId, MediaFrame};
use retell::errors::{ExtractionError, PipelineError};
use retell::extract::web::{ExtractionChain, ExtractionStrategy};
use retell::media::frames::FrameSampler;
use retell::media::video::VideoUnderstandingChain;
use retell::normalize::{Normalizer, NormalizerDeps};
use retell::transport::ChatTransport;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub chat_id: ConversationId,
    pub text: String,
    pub reply_to: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPhoto {
    pub chat_id: ConversationId,
    pub jpeg: Vec<u8>,
    pub caption: String,
}

/// In-memory messaging platform.
#[derive(Default)]
pub struct FakeTransport {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub downloads: AtomicUsize,
    pub texts: Mutex<Vec<SentText>>,
    pub photos: Mutex<Vec<SentPhoto>>,
}

impl FakeTransport {
    pub fn with_file(self, file_id: &str, bytes: Vec<u8>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), bytes);
        self
    }

    pub fn texts(&self) -> Vec<SentText> {
        self.texts.lock().unwrap().clone()
    }

    pub fn photos(&self) -> Vec<SentPhoto> {
        self.photos.lock().unwrap().clone()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn file_url(&self, file_id: &str) -> Result<String, PipelineError> {
        Ok(format!("https://files.test/{file_id}"))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, PipelineError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| PipelineError::Transport(format!("no such file {file_id}")))
    }

    async fn send_text(
        &self,
        chat_id: ConversationId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), PipelineError> {
        self.texts.lock().unwrap().push(SentText {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ConversationId,
        jpeg: Vec<u8>,
        caption: &str,
    ) -> Result<(), PipelineError> {
        self.photos.lock().unwrap().push(SentPhoto {
            chat_id,
            jpeg,
            caption: caption.to_string(),
        });
        Ok(())
    }
}

/// Completion service answering from a script; fails once the script runs out.
#[derive(Default)]
pub struct FakeCompletion {
    pub replies: Mutex<VecDeque<Result<String, PipelineError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn replying(replies: &[&str]) -> Self {
        let fake = Self::default();
        for reply in replies {
            fake.push(Ok((*reply).to_string()));
        }
        fake
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<String, PipelineError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Text of every message of the `n`th request.
    pub fn request_texts(&self, n: usize) -> Vec<String> {
        self.requests.lock().unwrap()[n]
            .messages
            .iter()
            .map(|m| match &m.content {
                Content::Text(text) => text.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, PipelineError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::Service("completion unavailable".to_string())))
    }
}

pub struct FakeVision {
    pub reply: Result<String, PipelineError>,
    pub urls: Mutex<Vec<String>>,
}

impl FakeVision {
    pub fn new(reply: Result<&str, PipelineError>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VisionService for FakeVision {
    async fn describe_image(
        &self,
        image_url: &str,
        _instruction: &str,
        _max_tokens: u32,
    ) -> Result<String, PipelineError> {
        self.urls.lock().unwrap().push(image_url.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(PipelineError::Service(e.to_string())),
        }
    }
}

pub struct FakeTranscriber {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
    pub file_names: Mutex<Vec<String>>,
}

impl FakeTranscriber {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
            file_names: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TranscriptionService for FakeTranscriber {
    async fn transcribe(&self, file_name: &str, _audio: Vec<u8>) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.file_names.lock().unwrap().push(file_name.to_string());
        self.reply
            .clone()
            .ok_or_else(|| PipelineError::Service("transcription unavailable".to_string()))
    }
}

pub struct FakeVideoService {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeVideoService {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VideoUnderstandingService for FakeVideoService {
    async fn understand_video(
        &self,
        _video: Vec<u8>,
        _mime_type: &str,
        _instruction: &str,
    ) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| PipelineError::Timeout("video model took too long".to_string()))
    }
}

/// Sampler returning `count` tiny fake frames for any path.
pub struct FakeSampler {
    pub count: usize,
    pub calls: AtomicUsize,
    pub paths: Mutex<Vec<PathBuf>>,
}

impl FakeSampler {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }
}

impl FrameSampler for FakeSampler {
    fn sample(&self, video_path: &Path, max_frames: usize) -> Vec<MediaFrame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(video_path.to_path_buf());
        (0..self.count.min(max_frames))
            .map(|i| MediaFrame {
                position: i,
                source_frame: i * 10,
                jpeg: vec![0xFF, 0xD8, u8::try_from(i).unwrap_or(0)],
            })
            .collect()
    }
}

/// Fakes behind one normalizer, kept around for assertions.
pub struct Services {
    pub transport: Arc<FakeTransport>,
    pub completion: Arc<FakeCompletion>,
    pub vision: Arc<FakeVision>,
    pub transcriber: Arc<FakeTranscriber>,
    pub direct: Option<Arc<FakeVideoService>>,
    pub sampler: Arc<FakeSampler>,
    pub web: ExtractionChain,
}

impl Services {
    pub fn new(transport: FakeTransport, completion: FakeCompletion) -> Self {
        Self {
            transport: Arc::new(transport),
            completion: Arc::new(completion),
            vision: Arc::new(FakeVision::new(Ok("a red bicycle"))),
            transcriber: Arc::new(FakeTranscriber::new(Some("spoken words"))),
            direct: None,
            sampler: Arc::new(FakeSampler::new(0)),
            web: ExtractionChain::new(Vec::new()),
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        let video = VideoUnderstandingChain::new(
            self.direct
                .clone()
                .map(|d| d as Arc<dyn VideoUnderstandingService>),
            self.transcriber.clone(),
            self.completion.clone(),
            self.sampler.clone(),
            "English",
        );
        Normalizer::new(NormalizerDeps {
            transport: self.transport.clone(),
            web: self.web.clone(),
            vision: self.vision.clone(),
            transcriber: self.transcriber.clone(),
            completion: self.completion.clone(),
            video,
            sampler: self.sampler.clone(),
            language: "English".to_string(),
        })
    }
}

/// Web strategy that always answers the same way.
pub struct FixedStrategy(pub Result<String, ExtractionError>);

#[async_trait]
impl ExtractionStrategy for FixedStrategy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn extract(&self, _url: &str) -> Result<String, ExtractionError> {
        self.0.clone()
    }
}

pub fn fixed_chain(result: Result<&str, ExtractionError>) -> ExtractionChain {
    ExtractionChain::new(vec![Arc::new(FixedStrategy(result.map(str::to_string)))])
}
