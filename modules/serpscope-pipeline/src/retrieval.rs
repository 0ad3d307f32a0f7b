use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use scraper::{ElementRef, Html, Node};
use tracing::{info, warn};

use serpscope_common::{EnrichedResult, SearchResult, MAX_PAGE_CHARS};

use crate::traits::PageScraper;

/// Desktop Chrome user agent; many sites block obvious bot agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Subtrees whose text never counts as page content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "iframe", "noscript"];

// --- Fan-out ---

/// Scrape every result concurrently and attach its text by position.
///
/// All fetches start at once and the call returns when the slowest settles.
/// A failed fetch leaves that entry's content as `None`; the output always
/// has one entry per input, in input order.
pub async fn retrieve(scraper: &dyn PageScraper, results: &[SearchResult]) -> Vec<EnrichedResult> {
    info!(count = results.len(), scraper = scraper.name(), "Scraping top results");

    let fetches = results.iter().map(|result| async move {
        let content = match scraper.scrape(&result.link).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(url = %result.link, error = %e, "Scrape failed, continuing without content");
                None
            }
        };
        EnrichedResult {
            result: result.clone(),
            content,
        }
    });

    let enriched = join_all(fetches).await;
    let succeeded = enriched.iter().filter(|r| r.content.is_some()).count();
    info!(
        succeeded,
        failed = enriched.len() - succeeded,
        "Retrieval stage complete"
    );
    enriched
}

// --- Text extraction ---

/// Visible text of an HTML document's body.
///
/// Drops script/style/nav/footer/iframe/noscript subtrees, collapses
/// whitespace runs to single spaces, trims, and caps the result at
/// `MAX_PAGE_CHARS` characters.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let Some(body) = document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
    else {
        return String::new();
    };

    let mut raw = String::new();
    let mut stack: Vec<_> = body.children().rev().collect();
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if !SKIPPED_TAGS.contains(&el.name()) => {
                stack.extend(node.children().rev());
            }
            _ => {}
        }
    }

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_PAGE_CHARS) {
        Some((end, _)) => collapsed[..end].to_string(),
        None => collapsed,
    }
}

// --- HTTP scraper ---

/// Plain GET scraper with a browser user agent and no cookie store.
/// No per-request timeout is set beyond the transport defaults.
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("{url} returned HTTP {status}");
        }

        if let Some(content_type) = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_text_content_type(content_type) {
                bail!("{url} is not a text document ({content_type})");
            }
        }

        let html = resp
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;
        let text = extract_text(&html);

        info!(url, scraper = "http", chars = text.chars().count(), "Scraped successfully");
        Ok(text)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn is_text_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("text/") || ct.contains("html") || ct.contains("xml")
}
