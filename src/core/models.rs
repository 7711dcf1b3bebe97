use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a chat or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a conversation transcript. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Photo,
    Document,
    Video,
    Voice,
    Audio,
    Poll,
}

impl Modality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Video => "video",
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single text blob produced for one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub text: String,
    pub modality: Modality,
}

impl NormalizedInput {
    #[must_use]
    pub fn new(text: impl Into<String>, modality: Modality) -> Self {
        Self {
            text: text.into(),
            modality,
        }
    }
}

/// Reference to a file stored on the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl FileRef {
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_name: None,
            mime_type: None,
            file_size: None,
        }
    }
}

/// One resolution variant of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Photo(Vec<PhotoSize>),
    Document(FileRef),
    Video(FileRef),
    Voice(FileRef),
    Audio(FileRef),
    Poll { question: String },
}

impl Payload {
    #[must_use]
    pub const fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Photo(_) => Modality::Photo,
            Self::Document(_) => Modality::Document,
            Self::Video(_) => Modality::Video,
            Self::Voice(_) => Modality::Voice,
            Self::Audio(_) => Modality::Audio,
            Self::Poll { .. } => Modality::Poll,
        }
    }
}

/// Envelope of one inbound message, as delivered by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ConversationId,
    pub message_id: Option<i64>,
    pub payload: Payload,
    pub caption: Option<String>,
}

impl InboundEvent {
    #[must_use]
    pub fn new(chat_id: ConversationId, payload: Payload) -> Self {
        Self {
            chat_id,
            message_id: None,
            payload,
            caption: None,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Caption trimmed to `None` when blank.
    #[must_use]
    pub fn caption_text(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// A sampled still from a video: JPEG bytes plus its place in the sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFrame {
    pub position: usize,
    pub source_frame: usize,
    pub jpeg: Vec<u8>,
}

/// Row persisted by the audit logger for every answered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub chat_id: i64,
    pub datetime: String,
    pub message: String,
    pub message_type: String,
    pub ai_response: String,
}
