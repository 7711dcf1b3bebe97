use std::env;
use std::path::PathBuf;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-3.5-turbo-1106";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_LOG_PATH: &str = "logs/telegram_bot_logs.csv";
pub const DEFAULT_LANGUAGE: &str = "Russian";
pub const DEFAULT_CHANNEL_NAME: &str = "Это не канал";

/// Which strategies the web extractor tries for a URL found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlFallbackMode {
    /// Generic HTML scrape only.
    GenericOnly,
    /// Generic HTML scrape, then the article extractor.
    WithArticle,
}

impl UrlFallbackMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::GenericOnly),
            "article" | "" => Ok(Self::WithArticle),
            other => Err(format!(
                "RETELL_URL_FALLBACK: expected `generic` or `article`, got `{other}`"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_api_base: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub summary_model: String,
    pub vision_model: String,
    pub transcription_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub log_path: PathBuf,
    pub url_fallback: UrlFallbackMode,
    pub language: String,
    pub channel_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let url_fallback = match env::var("RETELL_URL_FALLBACK") {
            Ok(raw) => UrlFallbackMode::parse(&raw)?,
            Err(_) => UrlFallbackMode::WithArticle,
        };

        Ok(Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|e| format!("TELEGRAM_BOT_TOKEN: {}", e))?,
            telegram_api_base: env_or("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE),
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|e| format!("OPENAI_API_KEY: {}", e))?,
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            summary_model: env_or("OPENAI_MODEL", DEFAULT_SUMMARY_MODEL),
            vision_model: env_or("OPENAI_VISION_MODEL", DEFAULT_VISION_MODEL),
            transcription_model: env_or("OPENAI_TRANSCRIPTION_MODEL", DEFAULT_TRANSCRIPTION_MODEL),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            log_path: PathBuf::from(env_or("RETELL_LOG_PATH", DEFAULT_LOG_PATH)),
            url_fallback,
            language: env_or("RETELL_LANGUAGE", DEFAULT_LANGUAGE),
            channel_name: env_or("RETELL_CHANNEL_NAME", DEFAULT_CHANNEL_NAME),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
