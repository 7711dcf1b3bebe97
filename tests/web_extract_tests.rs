use async_trait::async_trait;
use retell::core::config::UrlFallbackMode;
use retell::errors::ExtractionError;
use retell::extract::web::{
    ArticleExtractor, ExtractionChain, ExtractionStrategy, GenericScraper, browser_client,
};
use retell::prompt::{MAX_WEB_TEXT_CHARS, TRUNCATION_MARKER};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    browser_client(Duration::from_secs(5)).expect("client builds")
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{body}</body></html>"),
        "text/html; charset=utf-8",
    )
}

/// Fake strategy that records how often it ran.
struct Scripted {
    result: Result<String, ExtractionError>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(result: Result<&str, ExtractionError>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Arc::new(Self {
            result: result.map(str::to_string),
            calls: Arc::clone(&calls),
        });
        (strategy, calls)
    }
}

#[async_trait]
impl ExtractionStrategy for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract(&self, _url: &str) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[tokio::test]
async fn test_long_page_is_truncated_with_marker() {
    let server = MockServer::start().await;
    serve(&server, "/long", html(&format!("<p>{}</p>", "x".repeat(20_000)))).await;

    let text = GenericScraper::new(client())
        .extract(&format!("{}/long", server.uri()))
        .await
        .expect("page extracted");

    let content = text.strip_suffix(TRUNCATION_MARKER).expect("marker appended");
    assert_eq!(content.chars().count(), MAX_WEB_TEXT_CHARS);
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/missing", ResponseTemplate::new(404)).await;

    let result = GenericScraper::new(client())
        .extract(&format!("{}/missing", server.uri()))
        .await;
    assert_eq!(result, Err(ExtractionError::HttpError(404)));
}

#[tokio::test]
async fn test_non_html_content_is_rejected() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/paper.pdf",
        ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
    )
    .await;

    let result = GenericScraper::new(client())
        .extract(&format!("{}/paper.pdf", server.uri()))
        .await;
    assert!(matches!(
        result,
        Err(ExtractionError::UnsupportedContentType(ct)) if ct == "application/pdf"
    ));
}

#[tokio::test]
async fn test_meta_declared_charset_is_decoded() {
    let server = MockServer::start().await;
    let mut page =
        b"<html><head><meta charset=\"windows-1251\"></head><body><p>".to_vec();
    // "Привет, мир" in windows-1251
    page.extend_from_slice(&[
        0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, 0x2C, 0x20, 0xEC, 0xE8, 0xF0,
    ]);
    page.extend_from_slice(b"</p></body></html>");
    serve(
        &server,
        "/ru",
        ResponseTemplate::new(200).set_body_raw(page, "text/html"),
    )
    .await;

    let text = GenericScraper::new(client())
        .extract(&format!("{}/ru", server.uri()))
        .await
        .expect("page extracted");
    assert_eq!(text, "Привет, мир");
}

#[tokio::test]
async fn test_closed_port_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("port available");
    let address = listener.local_addr().expect("bound address");
    drop(listener);

    let result = GenericScraper::new(client())
        .extract(&format!("http://{address}/"))
        .await;
    assert_eq!(result, Err(ExtractionError::ConnectionError));
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow",
        html("<p>late</p>").set_delay(Duration::from_secs(2)),
    )
    .await;

    let impatient = browser_client(Duration::from_millis(200)).expect("client builds");
    let result = GenericScraper::new(impatient)
        .extract(&format!("{}/slow", server.uri()))
        .await;
    assert_eq!(result, Err(ExtractionError::Timeout));
}

#[tokio::test]
async fn test_url_without_host_stops_chain_before_any_request() {
    let (later, later_calls) = Scripted::new(Ok("should not run"));
    let chain = ExtractionChain::new(vec![Arc::new(GenericScraper::new(client())), later]);

    assert_eq!(chain.extract("http://").await, Err(ExtractionError::InvalidUrl));
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chain_falls_back_after_failure() {
    let (first, first_calls) = Scripted::new(Err(ExtractionError::Timeout));
    let (second, second_calls) = Scripted::new(Ok("article body"));
    let chain = ExtractionChain::new(vec![first, second]);

    assert_eq!(
        chain.extract("https://example.com").await,
        Ok("article body".to_string())
    );
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chain_reports_first_failure_when_all_fail() {
    let (first, _) = Scripted::new(Err(ExtractionError::HttpError(503)));
    let (second, _) = Scripted::new(Err(ExtractionError::ConnectionError));
    let chain = ExtractionChain::new(vec![first, second]);

    assert_eq!(
        chain.extract("https://example.com").await,
        Err(ExtractionError::HttpError(503))
    );
}

#[tokio::test]
async fn test_empty_scrape_falls_through_to_article_extractor() {
    let (empty, _) = Scripted::new(Ok("   "));
    let (failing, _) = Scripted::new(Err(ExtractionError::Timeout));
    let chain = ExtractionChain::new(vec![empty, failing]);

    // Nothing better came back, so the empty success wins over the failure.
    assert_eq!(chain.extract("https://example.com").await, Ok(String::new()));
}

#[tokio::test]
async fn test_article_mode_extracts_main_content() {
    let server = MockServer::start().await;
    let paragraph = "Sentences about the subject of the article go here. ".repeat(6);
    serve(
        &server,
        "/post",
        html(&format!(
            "<nav>Home</nav><article><p>{paragraph}</p><p>{paragraph}</p></article>"
        )),
    )
    .await;

    let chain = ExtractionChain::from_mode(&client(), UrlFallbackMode::WithArticle);
    let text = chain
        .extract(&format!("{}/post", server.uri()))
        .await
        .expect("text extracted");
    assert!(text.contains("Sentences about the subject"));
    assert!(!text.contains("Home"));

    let article = ArticleExtractor::new(client())
        .extract(&format!("{}/post", server.uri()))
        .await
        .expect("article extracted");
    assert!(article.contains("Sentences about the subject"));
}
