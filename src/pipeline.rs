//! One inbound event from arrival to reply.

use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use crate::ai::services::{CompletionService, TranscriptionService, VideoUnderstandingService, VisionService};
use crate::ai::{GeminiClient, LlmClient};
use crate::audit::AuditLogger;
use crate::conversation::{ConversationStore, SummarizationDispatcher};
use crate::core::config::AppConfig;
use crate::core::models::{InboundEvent, Payload};
use crate::errors::PipelineError;
use crate::extract::web::{ExtractionChain, FETCH_TIMEOUT, browser_client};
use crate::media::frames::{FfmpegSampler, FrameSampler};
use crate::media::video::VideoUnderstandingChain;
use crate::normalize::{Normalized, Normalizer, NormalizerDeps};
use crate::prompt::welcome_message;
use crate::transport::ChatTransport;

const START_COMMAND: &str = "/start";

fn is_start_command(payload: &Payload) -> bool {
    let Payload::Text(text) = payload else {
        return false;
    };
    let Some(command) = text.split_whitespace().next() else {
        return false;
    };
    // Group chats address commands as `/start@botname`.
    command == START_COMMAND || command.starts_with("/start@")
}

pub struct Pipeline {
    transport: Arc<dyn ChatTransport>,
    normalizer: Normalizer,
    dispatcher: SummarizationDispatcher,
    channel_name: String,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        normalizer: Normalizer,
        dispatcher: SummarizationDispatcher,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            normalizer,
            dispatcher,
            channel_name: channel_name.into(),
        }
    }

    /// Wire the production services behind `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn ChatTransport>,
        audit: Arc<AuditLogger>,
    ) -> Result<Self, PipelineError> {
        let http = Client::builder().build()?;
        let llm = Arc::new(LlmClient::new(http.clone(), config));
        let completion: Arc<dyn CompletionService> = llm.clone();
        let vision: Arc<dyn VisionService> = llm.clone();
        let transcriber: Arc<dyn TranscriptionService> = llm;
        let direct = GeminiClient::from_config(http, config)
            .map(|c| Arc::new(c) as Arc<dyn VideoUnderstandingService>);
        if direct.is_none() {
            info!("GEMINI_API_KEY not set; videos use transcript and frames only");
        }
        let sampler: Arc<dyn FrameSampler> = Arc::new(FfmpegSampler);

        let web = ExtractionChain::from_mode(&browser_client(FETCH_TIMEOUT)?, config.url_fallback);
        let video = VideoUnderstandingChain::new(
            direct,
            Arc::clone(&transcriber),
            Arc::clone(&completion),
            Arc::clone(&sampler),
            config.language.clone(),
        );

        let normalizer = Normalizer::new(NormalizerDeps {
            transport: Arc::clone(&transport),
            web,
            vision,
            transcriber,
            completion: Arc::clone(&completion),
            video,
            sampler,
            language: config.language.clone(),
        });
        let dispatcher = SummarizationDispatcher::new(
            Arc::new(ConversationStore::new()),
            completion,
            audit,
            config.channel_name.clone(),
            config.language.clone(),
        );

        Ok(Self::new(transport, normalizer, dispatcher, config.channel_name.clone()))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        self.dispatcher.store()
    }

    /// Normalize, summarize and answer one event.
    ///
    /// Every failure short of the final send is turned into some reply to
    /// the user.
    ///
    /// # Errors
    ///
    /// Returns an error only if the reply itself cannot be delivered.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), PipelineError> {
        if is_start_command(&event.payload) {
            self.store().conversation(event.chat_id);
            info!("Started conversation {}", event.chat_id);
            return self
                .transport
                .send_text(event.chat_id, &welcome_message(&self.channel_name), None)
                .await;
        }

        let input = match self.normalizer.normalize(&event).await {
            Normalized::Ready(input) => input,
            Normalized::Rejected => {
                info!("Event in chat {} ended without summarization", event.chat_id);
                return Ok(());
            }
        };

        let reply = self.dispatcher.respond(event.chat_id, &input).await;
        self.transport
            .send_text(event.chat_id, reply.text(), event.message_id)
            .await
    }
}
