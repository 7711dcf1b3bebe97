//! Bot API update payloads, reduced to what the pipeline reads.

use serde::Deserialize;

use crate::core::models::{ConversationId, FileRef, InboundEvent, Payload, PhotoSize};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Poll {
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub voice: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    #[serde(default)]
    pub poll: Option<Poll>,
}

impl Message {
    fn payload(self) -> Option<(Payload, Option<String>)> {
        let caption = self.caption;
        let payload = if let Some(text) = self.text {
            Payload::Text(text)
        } else if let Some(sizes) = self.photo.filter(|s| !s.is_empty()) {
            Payload::Photo(sizes)
        } else if let Some(file) = self.video {
            Payload::Video(file)
        } else if let Some(file) = self.document {
            Payload::Document(file)
        } else if let Some(file) = self.voice {
            Payload::Voice(file)
        } else if let Some(file) = self.audio {
            Payload::Audio(file)
        } else if let Some(poll) = self.poll {
            Payload::Poll {
                question: poll.question,
            }
        } else {
            return None;
        };
        Some((payload, caption))
    }
}

impl Update {
    /// The inbound event carried by a new message or channel post.
    ///
    /// Edits, service messages and unsupported content yield `None`.
    #[must_use]
    pub fn into_event(self) -> Option<InboundEvent> {
        let message = self.message.or(self.channel_post)?;
        let chat_id = ConversationId(message.chat.id);
        let message_id = message.message_id;
        let (payload, caption) = message.payload()?;

        let mut event = InboundEvent::new(chat_id, payload);
        event.message_id = Some(message_id);
        event.caption = caption;
        Some(event)
    }
}
