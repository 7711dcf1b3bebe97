use crate::core::models::{Modality, NormalizedInput};

/// Polls expose only their question.
#[must_use]
pub fn normalize_poll(question: &str) -> NormalizedInput {
    NormalizedInput::new(format!("Poll: {question}"), Modality::Poll)
}
