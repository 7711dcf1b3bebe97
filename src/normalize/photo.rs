use tracing::{info, warn};

use super::Normalizer;
use crate::core::models::{InboundEvent, Modality, NormalizedInput, PhotoSize};
use crate::errors::PipelineError;
use crate::prompt::{NO_DESCRIPTION, PHOTO_MAX_TOKENS, photo_instruction};

const PHOTO_PLACEHOLDER: &str = "Photo without caption";

/// The variant with the most pixels; file size breaks ties.
#[must_use]
pub fn largest_variant(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes.iter().max_by_key(|s| {
        (
            u64::from(s.width) * u64::from(s.height),
            s.file_size.unwrap_or(0),
        )
    })
}

impl Normalizer {
    /// Caption (with linked page) plus a short description of the image.
    pub async fn photo(&self, event: &InboundEvent, sizes: &[PhotoSize]) -> NormalizedInput {
        let caption = event.caption_text().unwrap_or(PHOTO_PLACEHOLDER);
        let mut body = self.with_linked_page(event.chat_id, caption).await;

        let description = match self.describe_photo(sizes).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Image description failed in chat {}: {}", event.chat_id, e);
                NO_DESCRIPTION.to_string()
            }
        };
        body.push_str(&format!("\nImage description: {description}"));

        NormalizedInput::new(body, Modality::Photo)
    }

    async fn describe_photo(&self, sizes: &[PhotoSize]) -> Result<String, PipelineError> {
        let photo = largest_variant(sizes)
            .ok_or_else(|| PipelineError::Validation("photo message without sizes".to_string()))?;
        let image_url = self.deps.transport.file_url(&photo.file_id).await?;
        info!("Describing {}x{} image", photo.width, photo.height);

        self.deps
            .vision
            .describe_image(
                &image_url,
                &photo_instruction(&self.deps.language),
                PHOTO_MAX_TOKENS,
            )
            .await
    }
}
