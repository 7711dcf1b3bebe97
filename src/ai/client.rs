//! LLM (`OpenAI`-compatible) API client module
//!
//! Encapsulates chat completions, image description and speech-to-text.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{
    ChatCompletionMessage, Content, ContentType, ImageUrl, ImageUrlType, MessageRole,
};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::services::{
    CompletionRequest, CompletionService, ModelTier, TranscriptionService, VisionService,
};
use crate::core::config::AppConfig;
use crate::errors::PipelineError;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);
const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(120);

#[must_use]
pub fn canonicalize_mime(mime: &str) -> String {
    let main = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match main.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for replies, document analysis, vision and transcription
pub struct LlmClient {
    http: Client,
    api_key: String,
    base_url: String,
    summary_model: String,
    analysis_model: String,
    transcription_model: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(http: Client, config: &AppConfig) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            summary_model: config.summary_model.clone(),
            analysis_model: config.vision_model.clone(),
            transcription_model: config.transcription_model.clone(),
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Summary => &self.summary_model,
            ModelTier::Analysis => &self.analysis_model,
        }
    }

    fn auth_headers(&self) -> Result<reqwest::header::HeaderMap, PipelineError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| PipelineError::Config(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);
        Ok(headers)
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatCompletionMessage],
        max_tokens: Option<u32>,
    ) -> Result<String, PipelineError> {
        #[cfg(feature = "debug-logs")]
        info!("Using chat prompt:\n{:?}", messages);

        let estimated_input_tokens = messages
            .iter()
            .map(|msg| estimate_tokens(&format!("{:?}", msg.content)))
            .sum::<usize>();
        info!(
            "Requesting completion from {} with {} messages (~{} tokens)",
            model,
            messages.len(),
            estimated_input_tokens
        );

        let mut request_body = json!({
            "model": model,
            "messages": build_chat_messages(messages),
        });
        if let Some(limit) = max_tokens {
            request_body["max_tokens"] = json!(limit);
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.auth_headers()?)
            .timeout(COMPLETION_TIMEOUT)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(PipelineError::Service(format!(
                "Completion API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            PipelineError::Service(format!("Failed to parse completion response: {e}"))
        })?;
        debug!("Completion usage: {:?}", response_json.get("usage"));

        extract_completion_text(&response_json)
            .ok_or_else(|| PipelineError::Service("No text in completion response".to_string()))
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, PipelineError> {
        self.chat(
            self.model_for(request.tier),
            &request.messages,
            request.max_tokens,
        )
        .await
    }
}

#[async_trait]
impl VisionService for LlmClient {
    async fn describe_image(
        &self,
        image_url: &str,
        instruction: &str,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        let message = ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::ImageUrl(vec![
                ImageUrl {
                    r#type: ContentType::text,
                    text: Some(instruction.to_string()),
                    image_url: None,
                },
                ImageUrl {
                    r#type: ContentType::image_url,
                    text: None,
                    image_url: Some(ImageUrlType {
                        url: image_url.to_string(),
                    }),
                },
            ]),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        };
        self.chat(&self.analysis_model, &[message], Some(max_tokens))
            .await
    }
}

#[async_trait]
impl TranscriptionService for LlmClient {
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<String, PipelineError> {
        let byte_len = audio.len();
        let mime = canonicalize_mime(mime_guess::from_path(file_name).first_or_octet_stream().as_ref());
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(&mime)
            .map_err(|e| PipelineError::Service(format!("Invalid audio MIME type {mime}: {e}")))?;
        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        info!("Transcribing {} ({} bytes, {})", file_name, byte_len, mime);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .headers(self.auth_headers()?)
            .timeout(TRANSCRIPTION_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Service(format!(
                "Transcription API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response.json().await?;
        response_json
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Service("No text in transcription response".to_string()))
    }
}

/// Chat Completions wire format for the typed prompt.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::assistant => "assistant",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
            };

            let content = match &m.content {
                Content::Text(t) => Value::String(t.clone()),
                Content::ImageUrl(parts) => Value::Array(
                    parts
                        .iter()
                        .filter_map(|part| {
                            if let Some(ref iu) = part.image_url {
                                Some(json!({
                                    "type": "image_url",
                                    "image_url": { "url": iu.url }
                                }))
                            } else {
                                part.text.as_ref().map(|t| {
                                    json!({
                                        "type": "text",
                                        "text": t
                                    })
                                })
                            }
                        })
                        .collect(),
                ),
            };

            json!({
                "role": role_str,
                "content": content
            })
        })
        .collect()
}

fn extract_completion_text(response_json: &Value) -> Option<String> {
    response_json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
