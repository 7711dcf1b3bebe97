//! Web text extraction.
//!
//! Two independent strategies turn a URL into plain text: a generic scrape
//! of the whole page and an article extractor that looks for the main content
//! block. [`ExtractionChain`] tries them in order until one yields text.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::UrlFallbackMode;
use crate::errors::{ExtractionError, PipelineError};
use crate::prompt::{MAX_WEB_TEXT_CHARS, truncate_with_marker};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text is page chrome rather than content.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "template",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "section", "article", "main", "title", "blockquote", "pre", "table", "figcaption",
];

const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    "[itemprop=\"articleBody\"]",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".entry-content",
    ".article-body",
    "#content",
];

/// Below this many characters of paragraph text a candidate is not an article.
const MIN_ARTICLE_CHARS: usize = 200;

const RENDER_WIDTH: usize = 200;

/// How much of the body is searched for a `<meta>` charset declaration.
const CHARSET_SNIFF_BYTES: usize = 1024;

static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("Failed to compile meta charset regex")
});

/// HTTP client that presents itself like a desktop browser.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn browser_client(timeout: Duration) -> Result<Client, PipelineError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("Failed to build browser HTTP client: {e}")))
}

/// Accepts only absolute URLs with a non-empty host.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidUrl`] otherwise.
pub fn validate_url(raw: &str) -> Result<Url, ExtractionError> {
    let url = Url::parse(raw.trim()).map_err(|_| ExtractionError::InvalidUrl)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ExtractionError::InvalidUrl),
    }
}

/// Single GET of an HTML page. No retries.
async fn fetch_html(client: &Client, raw_url: &str) -> Result<String, ExtractionError> {
    let url = validate_url(raw_url)?;

    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::HttpError(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(content_type) = &content_type {
        let lowered = content_type.to_ascii_lowercase();
        if !(lowered.contains("text/html") || lowered.contains("application/xhtml+xml")) {
            return Err(ExtractionError::UnsupportedContentType(
                content_type.clone(),
            ));
        }
    }

    let bytes = response.bytes().await?;
    let body = decode_html(&bytes, content_type.as_deref().and_then(charset_param));
    info!("Fetched {} ({} bytes of HTML)", url, bytes.len());
    Ok(body)
}

/// The `charset` parameter of a Content-Type header value.
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Charset declared by a `<meta charset>` or `http-equiv` tag near the top
/// of the document.
fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(CHARSET_SNIFF_BYTES)];
    let label = META_CHARSET_RE.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}

/// HTML bytes as text. The header charset wins, then a `<meta>` declaration,
/// then UTF-8. A byte order mark overrides all of them.
#[must_use]
pub fn decode_html(body: &[u8], header_charset: Option<&str>) -> String {
    let encoding = header_charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!("Malformed {} sequences replaced while decoding page", used.name());
    }
    text.into_owned()
}

/// Trim every line, split on runs of double spaces, drop empty pieces.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// All visible text of a page with script, style and navigation chrome removed.
#[must_use]
pub fn render_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    collect_visible_text(document.root_element(), &mut out);
    clean_text(&out)
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block {
                out.push('\n');
            }
            collect_visible_text(child_element, out);
            if is_block {
                out.push('\n');
            }
        }
    }
}

fn paragraph_chars(element: ElementRef<'_>) -> usize {
    let Ok(paragraphs) = Selector::parse("p") else {
        return 0;
    };
    element
        .select(&paragraphs)
        .map(|p| p.text().map(|t| t.trim().chars().count()).sum::<usize>())
        .sum()
}

/// Text of the main content block of a page, if one can be identified.
#[must_use]
pub fn extract_article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for raw_selector in ARTICLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for candidate in document.select(&selector) {
            let score = paragraph_chars(candidate);
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, candidate));
            }
        }
    }

    // No semantic container: take the element holding the most paragraph text.
    if best.is_none_or(|(score, _)| score < MIN_ARTICLE_CHARS)
        && let Ok(paragraphs) = Selector::parse("p")
    {
        let mut scores = HashMap::new();
        for p in document.select(&paragraphs) {
            if let Some(parent) = p.parent() {
                let chars: usize = p.text().map(|t| t.trim().chars().count()).sum();
                *scores.entry(parent.id()).or_insert(0usize) += chars;
            }
        }
        if let Some((id, score)) = scores.into_iter().max_by_key(|(_, score)| *score)
            && let Some(element) = document.tree.get(id).and_then(ElementRef::wrap)
        {
            best = Some((score, element));
        }
    }

    let (score, element) = best?;
    if score < MIN_ARTICLE_CHARS {
        return None;
    }

    let fragment = element.html();
    let rendered = html2text::from_read(fragment.as_bytes(), RENDER_WIDTH).ok()?;
    let cleaned = clean_text(&rendered);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// One way of turning a URL into text.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns the failure kind that stopped this strategy.
    async fn extract(&self, url: &str) -> Result<String, ExtractionError>;
}

/// Whole-page scrape with page chrome stripped.
pub struct GenericScraper {
    client: Client,
}

impl GenericScraper {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionStrategy for GenericScraper {
    fn name(&self) -> &'static str {
        "generic-scrape"
    }

    async fn extract(&self, url: &str) -> Result<String, ExtractionError> {
        let html = fetch_html(&self.client, url).await?;
        let text = render_visible_text(&html);
        Ok(truncate_with_marker(&text, MAX_WEB_TEXT_CHARS))
    }
}

/// Main-content extraction for article-like pages.
pub struct ArticleExtractor {
    client: Client,
}

impl ArticleExtractor {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionStrategy for ArticleExtractor {
    fn name(&self) -> &'static str {
        "article"
    }

    async fn extract(&self, url: &str) -> Result<String, ExtractionError> {
        let html = fetch_html(&self.client, url).await?;
        let text = extract_article_text(&html)
            .ok_or_else(|| ExtractionError::Other("no article content found".to_string()))?;
        Ok(truncate_with_marker(&text, MAX_WEB_TEXT_CHARS))
    }
}

/// Ordered list of strategies tried until one yields text.
#[derive(Clone)]
pub struct ExtractionChain {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl ExtractionChain {
    #[must_use]
    pub fn new(strategies: Vec<Arc<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn from_mode(client: &Client, mode: UrlFallbackMode) -> Self {
        let mut strategies: Vec<Arc<dyn ExtractionStrategy>> =
            vec![Arc::new(GenericScraper::new(client.clone()))];
        if mode == UrlFallbackMode::WithArticle {
            strategies.push(Arc::new(ArticleExtractor::new(client.clone())));
        }
        Self::new(strategies)
    }

    /// Text from the first strategy that produces any.
    ///
    /// A successful but empty extraction is only returned when no later
    /// strategy does better. An invalid URL stops the chain at once.
    ///
    /// # Errors
    ///
    /// Returns the first strategy's failure when every strategy fails.
    pub async fn extract(&self, url: &str) -> Result<String, ExtractionError> {
        let mut first_failure: Option<ExtractionError> = None;
        let mut empty_success = false;

        for strategy in &self.strategies {
            match strategy.extract(url).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(
                        "Strategy {} extracted {} characters from {}",
                        strategy.name(),
                        text.chars().count(),
                        url
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    warn!("Strategy {} found no text at {}", strategy.name(), url);
                    empty_success = true;
                }
                Err(ExtractionError::InvalidUrl) => return Err(ExtractionError::InvalidUrl),
                Err(e) => {
                    warn!("Strategy {} failed for {}: {}", strategy.name(), url, e);
                    first_failure.get_or_insert(e);
                }
            }
        }

        if empty_success {
            return Ok(String::new());
        }
        Err(first_failure.unwrap_or_else(|| {
            ExtractionError::Other("no extraction strategy configured".to_string())
        }))
    }
}
