//! Direct multimodal video understanding through the Gemini `generateContent` API.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use super::services::VideoUnderstandingService;
use crate::core::config::AppConfig;
use crate::errors::PipelineError;

const VIDEO_TIMEOUT: Duration = Duration::from_secs(180);

pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// `None` when no Gemini key is configured.
    #[must_use]
    pub fn from_config(http: Client, config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;
        Some(Self {
            http,
            api_key,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        })
    }
}

#[async_trait]
impl VideoUnderstandingService for GeminiClient {
    async fn understand_video(
        &self,
        video: Vec<u8>,
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, PipelineError> {
        info!(
            "Sending {} bytes of {} to {} for direct video understanding",
            video.len(),
            mime_type,
            self.model
        );

        let request_body = json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": general_purpose::STANDARD.encode(&video),
                        }
                    },
                    { "text": instruction }
                ]
            }]
        });

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .timeout(VIDEO_TIMEOUT)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Service(format!(
                "Video understanding API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response.json().await?;
        extract_candidate_text(&response_json).ok_or_else(|| {
            PipelineError::Service("No text in video understanding response".to_string())
        })
    }
}

fn extract_candidate_text(response_json: &Value) -> Option<String> {
    let parts = response_json
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let collected: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    let text = collected.join("\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
