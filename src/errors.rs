use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Rejected input: {0}")]
    Validation(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to access AI service: {0}")]
    Service(String),

    #[error("Failed to access messaging platform: {0}")]
    Transport(String),

    #[error("Failed to access local file: {0}")]
    Io(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to process media: {0}")]
    Media(String),
}

impl PipelineError {
    /// Transient failures are the ones a different strategy may still get past.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PipelineError::Timeout(error.to_string())
        } else {
            PipelineError::Http(error.to_string())
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::Io(error.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(error: csv::Error) -> Self {
        PipelineError::Io(format!("CSV write failed: {error}"))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Service(format!("Unexpected response shape: {error}"))
    }
}

/// Failure of a single web extraction strategy.
///
/// Every message starts with [`EXTRACTION_FAILURE_PREFIX`] so that a rendered
/// failure can never be mistaken for page text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Extraction failed: invalid URL")]
    InvalidUrl,

    #[error("Extraction failed: timed out while loading the page")]
    Timeout,

    #[error("Extraction failed: could not connect to the server")]
    ConnectionError,

    #[error("Extraction failed: HTTP error {0}")]
    HttpError(u16),

    #[error("Extraction failed: unsupported content type {0}")]
    UnsupportedContentType(String),

    #[error("Extraction failed: {0}")]
    Other(String),
}

pub const EXTRACTION_FAILURE_PREFIX: &str = "Extraction failed:";

impl From<reqwest::Error> for ExtractionError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ExtractionError::Timeout
        } else if error.is_connect() {
            ExtractionError::ConnectionError
        } else if let Some(status) = error.status() {
            ExtractionError::HttpError(status.as_u16())
        } else {
            ExtractionError::Other(error.to_string())
        }
    }
}
