//! Telegram Bot API client.
//!
//! Encapsulates file resolution, downloads, replies and long polling.

pub mod updates;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::models::ConversationId;
use crate::errors::PipelineError;
use crate::transport::ChatTransport;
pub use updates::Update;

/// Longest text the Bot API accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Server-side wait of one `getUpdates` call.
pub const POLL_TIMEOUT_SECS: u64 = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

/// Split `text` into chunks the Bot API accepts, on character boundaries.
#[must_use]
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(http: Client, config: &AppConfig) -> Self {
        Self::with_base(http, &config.telegram_api_base, &config.telegram_bot_token)
    }

    #[must_use]
    pub fn with_base(http: Client, api_base: &str, token: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn parse<T: DeserializeOwned>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T, PipelineError> {
        let status = resp.status();
        let body: ApiResponse<T> = resp.json().await.map_err(|e| {
            PipelineError::Transport(format!("{method}: unreadable response ({status}): {e}"))
        })?;

        if !body.ok {
            return Err(PipelineError::Transport(format!(
                "{method} failed: {}",
                body.description
                    .unwrap_or_else(|| format!("HTTP {status}"))
            )));
        }
        body.result
            .ok_or_else(|| PipelineError::Transport(format!("{method}: response without result")))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<T, PipelineError> {
        let resp = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;
        Self::parse(method, resp).await
    }

    /// Stop webhook delivery and drop updates queued while the bot was down.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the call.
    pub async fn skip_pending_updates(&self) -> Result<(), PipelineError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &json!({ "drop_pending_updates": true }),
                REQUEST_TIMEOUT,
            )
            .await?;
        info!("Dropped pending updates");
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports an error.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, PipelineError> {
        let mut payload = json!({
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "edited_message", "channel_post", "edited_channel_post"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call(
            "getUpdates",
            &payload,
            REQUEST_TIMEOUT + Duration::from_secs(POLL_TIMEOUT_SECS),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn file_url(&self, file_id: &str) -> Result<String, PipelineError> {
        let file: TelegramFile = self
            .call("getFile", &json!({ "file_id": file_id }), REQUEST_TIMEOUT)
            .await?;
        let path = file.file_path.ok_or_else(|| {
            PipelineError::Transport(format!("getFile: no file_path for {file_id}"))
        })?;
        Ok(format!("{}/file/bot{}/{}", self.api_base, self.token, path))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, PipelineError> {
        let url = self.file_url(file_id).await?;
        let resp = self
            .http
            .get(&url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        debug!("Downloaded file {}: {} bytes", file_id, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn send_text(
        &self,
        chat_id: ConversationId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), PipelineError> {
        for (i, chunk) in split_message(text, MAX_MESSAGE_CHARS).into_iter().enumerate() {
            let mut payload = json!({ "chat_id": chat_id.0, "text": chunk });
            if i == 0
                && let Some(message_id) = reply_to
            {
                payload["reply_parameters"] = json!({
                    "message_id": message_id,
                    "allow_sending_without_reply": true,
                });
            }
            let _: Value = self.call("sendMessage", &payload, REQUEST_TIMEOUT).await?;
        }
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ConversationId,
        jpeg: Vec<u8>,
        caption: &str,
    ) -> Result<(), PipelineError> {
        let photo = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("chat_id", chat_id.0.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let resp = self
            .http
            .post(self.method_url("sendPhoto"))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::parse("sendPhoto", resp).await?;
        Ok(())
    }
}
