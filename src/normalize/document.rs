use tracing::{error, info, warn};

use super::video::is_video_document;
use super::{Normalized, Normalizer};
use crate::ai::services::CompletionRequest;
use crate::core::models::{FileRef, InboundEvent, Modality, NormalizedInput};
use crate::errors::PipelineError;
use crate::extract::pdf::extract_pdf_text;
use crate::prompt::{PDF_MAX_TOKENS, SEND_PDF_NOTICE, pdf_summary_prompt};

pub(super) const DOCUMENT_PLACEHOLDER: &str = "Document";

fn is_pdf(file: &FileRef) -> bool {
    let by_name = file
        .file_name
        .as_deref()
        .is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"));
    let by_mime = file
        .mime_type
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case("application/pdf"));
    by_name || by_mime
}

impl Normalizer {
    /// Video-like documents take the video path, PDFs are summarized, anything
    /// else is refused.
    pub async fn document(&self, event: &InboundEvent, file: &FileRef) -> Normalized {
        if is_video_document(file) {
            return self.video_document(event, file).await;
        }
        if !is_pdf(file) {
            info!(
                "Refusing document {:?} ({:?}) in chat {}",
                file.file_name, file.mime_type, event.chat_id
            );
            self.notify(event.chat_id, SEND_PDF_NOTICE, event.message_id)
                .await;
            return Normalized::Rejected;
        }

        if !self.within_size_limit(event, file.file_size).await {
            return Normalized::Rejected;
        }

        let caption = event.caption_text().unwrap_or(DOCUMENT_PLACEHOLDER);
        let mut body = self.with_linked_page(event.chat_id, caption).await;

        let bytes = match self.deps.transport.download(&file.file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("PDF download failed in chat {}: {}", event.chat_id, e);
                body.push_str("\nCould not get the PDF document.");
                return Normalized::Ready(NormalizedInput::new(body, Modality::Document));
            }
        };
        if !self.within_size_limit(event, Some(bytes.len() as u64)).await {
            return Normalized::Rejected;
        }
        info!("Downloaded PDF: {} bytes", bytes.len());

        let pdf_text = match pdf_text(bytes).await {
            Ok(text) if text.is_empty() => {
                warn!("No text found in PDF {:?}", file.file_name);
                body.push_str("\nCould not extract text from the PDF document.");
                None
            }
            Ok(text) => Some(text),
            Err(e) => {
                error!("PDF processing failed in chat {}: {}", event.chat_id, e);
                body.push_str("\nCould not process the PDF file.");
                None
            }
        };

        if let Some(text) = pdf_text {
            let prompt = pdf_summary_prompt(&self.deps.language, &text);
            match self
                .deps
                .completion
                .complete(CompletionRequest::analysis(prompt, PDF_MAX_TOKENS))
                .await
            {
                Ok(analysis) => body.push_str(&format!("\n\nPDF document analysis:\n{analysis}")),
                Err(e) => {
                    error!("PDF analysis failed in chat {}: {}", event.chat_id, e);
                    body.push_str("\nCould not get an analysis of the PDF document.");
                }
            }
        }

        Normalized::Ready(NormalizedInput::new(body, Modality::Document))
    }
}

async fn pdf_text(bytes: Vec<u8>) -> Result<String, PipelineError> {
    let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| PipelineError::Media(format!("PDF extraction task failed: {e}")))??;
    info!("Extracted {} characters from PDF", text.chars().count());
    Ok(text)
}
