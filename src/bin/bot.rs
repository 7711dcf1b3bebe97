use anyhow::{Context, anyhow};
use reqwest::Client as HttpClient;
use retell::audit::AuditLogger;
use retell::core::config::AppConfig;
use retell::pipeline::Pipeline;
use retell::telegram::TelegramClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pause after a failed poll before asking again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    retell::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow!(e)
    })?;

    let audit = Arc::new(AuditLogger::new(&config.log_path));
    audit
        .initialize()
        .with_context(|| format!("Failed to initialize {}", config.log_path.display()))?;

    let telegram = Arc::new(TelegramClient::new(HttpClient::new(), &config));
    let pipeline = Pipeline::from_config(&config, telegram.clone(), audit)
        .context("Failed to build pipeline")?;

    if let Err(e) = telegram.skip_pending_updates().await {
        warn!("Could not drop pending updates: {}", e);
    }
    info!("Bot started, polling for updates");

    let mut offset = None;
    loop {
        let updates = match telegram.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                if e.is_transient() {
                    warn!("Polling failed: {}", e);
                } else {
                    error!("Polling rejected: {}", e);
                }
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        // Events are handled one at a time, in arrival order.
        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(event) = update.into_event() else {
                continue;
            };
            let chat_id = event.chat_id;
            if let Err(e) = pipeline.handle(event).await {
                error!("Failed to deliver reply to chat {}: {}", chat_id, e);
            }
        }
    }
}
