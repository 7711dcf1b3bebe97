//! All AI service access: the traits the pipeline depends on and their HTTP clients

pub mod client;
pub mod gemini;
pub mod services;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};
pub use gemini::GeminiClient;
pub use services::{
    CompletionRequest, CompletionService, ModelTier, TranscriptionService, VideoUnderstandingService,
    VisionService,
};
