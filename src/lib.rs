/// Retell - a Telegram bot that retells whatever is posted to a channel.
///
/// Every inbound message (text, photo, PDF, video, voice, audio, poll) is
/// normalized into one text blob through ordered fallback strategies, then
/// summarized with the chat's whole transcript as context.
///
/// # Architecture
///
/// - `normalize` turns each modality into a [`core::models::NormalizedInput`],
///   calling the web and PDF extractors, the frame sampler and the video chain
/// - `conversation` keeps per-chat transcripts and produces the reply
/// - `audit` appends every answered message to a CSV log
/// - `telegram` is the Bot API transport, `ai` the model clients
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use retell::audit::AuditLogger;
/// use retell::core::config::AppConfig;
/// use retell::pipeline::Pipeline;
/// use retell::telegram::TelegramClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     retell::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let audit = Arc::new(AuditLogger::new(&config.log_path));
///     audit.initialize()?;
///
///     let telegram = Arc::new(TelegramClient::new(reqwest::Client::new(), &config));
///     let pipeline = Pipeline::from_config(&config, telegram.clone(), audit)?;
///
///     for update in telegram.get_updates(None).await? {
///         if let Some(event) = update.into_event() {
///             pipeline.handle(event).await?;
///         }
///     }
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod audit;
pub mod conversation;
pub mod core;
pub mod errors;
pub mod extract;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod telegram;
pub mod transport;
pub mod utils;

pub use errors::{ExtractionError, PipelineError};
pub use pipeline::Pipeline;

/// Configure structured logging.
///
/// Output is JSON when `RETELL_LOG_FORMAT=json` and human-readable otherwise.
/// The level comes from `RUST_LOG` and defaults to `info`. Calling it again
/// after a subscriber is installed is a no-op.
///
/// # Example
///
/// ```
/// retell::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RETELL_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
}
