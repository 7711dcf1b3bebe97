/// Ceiling for text extracted from a web page.
pub const MAX_WEB_TEXT_CHARS: usize = 8_000;

/// Ceiling for text extracted from a PDF before it is summarized.
pub const MAX_PDF_TEXT_CHARS: usize = 12_000;

/// Ceiling for a normalized input before it reaches the summarization step.
pub const MAX_NORMALIZED_CHARS: usize = 16_000;

/// Instructed upper bound for a reply, in characters.
pub const MAX_REPLY_CHARS: usize = 3_000;

/// Telegram's caption limit for media messages.
pub const MAX_CAPTION_CHARS: usize = 1_024;

pub const PHOTO_MAX_TOKENS: u32 = 300;
pub const PDF_MAX_TOKENS: u32 = 500;
pub const VIDEO_MAX_TOKENS: u32 = 700;

/// Appended to any text cut at a ceiling.
pub const TRUNCATION_MARKER: &str = "\n... (text truncated due to size limits)";

pub const NO_DESCRIPTION: &str = "No description available.";

pub const APOLOGY_MESSAGE: &str = "Sorry, an error occurred while processing your request.";

/// Truncate `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
#[must_use]
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Hard cut without marker, for platform limits such as captions.
#[must_use]
pub fn clip_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The fixed instruction sent with every summarization request.
#[must_use]
pub fn system_instruction(channel_name: &str, language: &str) -> String {
    format!(
        "You are the administrator bot of the Telegram channel '{channel_name}'. Your task is to retell \
        in {language} the materials sent to the channel for its subscribers. Write a short (no more than \
        {MAX_REPLY_CHARS} characters) and engaging retelling, following these principles:\n\n\
        1. Read the post. If the post contains a link, assume it holds additional information and \
        retell based on the topic of the post and its plausible context.\n\
        2. Structure the retelling:\n\
        - Introduction: briefly explain what the material is about and why it matters.\n\
        - Main part: present the key points in plain language, split into paragraphs.\n\
        - Conclusion: draw conclusions, give recommendations or ask a question to engage subscribers.\n\
        3. If the post contains only a link, write a presumed retelling from the general context and \
        say that it is an interpretation.\n\
        4. Name the source at the end of the text (for example: 'Source: link from the post').\n\n\
        Address readers politely and formally.\n\n\
        Use emoji to accent key points:\n\
        - 🔍 for important details,\n\
        - 📌 for key theses,\n\
        - 🌟 for recommendations.\n\n\
        Keep the text easy to read in {language} and do not overload it with emoji."
    )
}

#[must_use]
pub fn photo_instruction(language: &str) -> String {
    format!("What is in this image? Give a short description in {language}.")
}

#[must_use]
pub fn pdf_summary_prompt(language: &str, pdf_text: &str) -> String {
    format!(
        "Analyze this PDF document and give a short description in {language}.\n\n\
        Include in the description:\n\
        - Document type\n\
        - Main theme/content\n\
        - Key points\n\
        - Number of pages (if visible from the text)\n\n\
        Document text:\n{pdf_text}"
    )
}

#[must_use]
pub fn video_direct_instruction(language: &str, user_message: &str) -> String {
    format!("Describe this video in detail in {language}. The user wrote: {user_message}")
}

#[must_use]
pub fn video_hybrid_prompt(language: &str, user_message: &str, evidence: &[String]) -> String {
    format!(
        "Analyze the video based on the available data.\n\
        User message: {user_message}\n\
        Data:\n{}\n\
        Write a coherent retelling of the video: plot, objects, actions, conclusions. Answer in {language}.",
        evidence.join("\n")
    )
}

pub const FRAMES_PRESENT_NOTE: &str =
    "Key frames were extracted; they show the objects and actions of the video.";

#[must_use]
pub fn size_exceeded_notice(size_bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let megabytes = size_bytes as f64 / 1024.0 / 1024.0;
    format!(
        "⚠️ The file is too large ({megabytes:.1} MB). Files over 20 MB cannot be downloaded. \
        Please send a shorter or compressed version."
    )
}

pub const SEND_PDF_NOTICE: &str = "Please send a PDF file.";

pub const TRANSCRIPTION_FAILED_NOTICE: &str = "An error occurred while transcribing the audio.";

#[must_use]
pub fn url_failure_notice(detail: &str) -> String {
    format!("Could not extract text from the link: {detail}")
}

#[must_use]
pub fn welcome_message(channel_name: &str) -> String {
    format!("Welcome to the channel '{channel_name}'! How can I help?")
}
