// Test mocks for the analysis pipeline.
//
// Four mocks matching the four trait boundaries:
// - MockSearcher (WebSearcher): fixed response or fixed failure
// - MockScraper (PageScraper): HashMap-based URL→text
// - MockGenerator (TextGenerator): HashMap-based model→reply, records calls
// - MockStore (ReportStore): records created reports
//
// Plus helpers for building search results and reports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_client::AiError;
use async_trait::async_trait;

use serpscope_common::{AnalysisReport, Result, SearchResponse, SearchResult, SerpscopeError};

use crate::traits::{PageScraper, ReportStore, TextGenerator, WebSearcher};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `n` results titled `Result 1..=n` linking to `https://site{i}.example/`.
pub fn search_results(n: usize) -> Vec<SearchResult> {
    (1..=n)
        .map(|i| SearchResult {
            title: format!("Result {i}"),
            link: format!("https://site{i}.example/"),
            snippet: format!("Snippet {i}"),
        })
        .collect()
}

/// A report with every field filled in.
pub fn sample_report(title: &str) -> AnalysisReport {
    AnalysisReport {
        title: title.to_string(),
        target: "Beginner and intermediate runners".to_string(),
        intent: "Compare current models before buying".to_string(),
        keywords: "cushioning, durability, price".to_string(),
        logic: "Pages with hands-on comparison tables rank first".to_string(),
        content: "## Overview\n\nTop pages compare models side by side.".to_string(),
        links: String::new(),
    }
}

/// `sample_report(title)` serialized the way a model would return it.
pub fn report_json(title: &str) -> String {
    serde_json::to_string(&sample_report(title)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

pub struct MockSearcher {
    response: std::result::Result<SearchResponse, String>,
    calls: AtomicUsize,
}

impl MockSearcher {
    pub fn new(response: SearchResponse) -> Self {
        Self {
            response: Ok(response),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every search fails as an upstream error with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, _topic: &str) -> Result<SearchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(|m| SerpscopeError::upstream("Search", m))
    }
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered URLs.
pub struct MockScraper {
    pages: HashMap<String, String>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn on_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }
}

impl Default for MockScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageScraper for MockScraper {
    async fn scrape(&self, url: &str) -> anyhow::Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockScraper: no page registered for {url}"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    NotFound,
    RateLimited,
    Fatal(String),
}

/// Models without a registered reply answer "not found".
pub struct MockGenerator {
    replies: HashMap<String, MockReply>,
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    cancel_on_call: Option<Arc<AtomicBool>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            cancel_on_call: None,
        }
    }

    pub fn on_model(mut self, model: &str, reply: MockReply) -> Self {
        self.replies.insert(model.to_string(), reply);
        self
    }

    /// Set `flag` whenever a model is called, simulating a client that
    /// disconnects while analysis is in flight.
    pub fn cancel_on_call(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_on_call = Some(flag);
        self
    }

    /// Model ids called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate_json(&self, model: &str, prompt: &str) -> ai_client::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(model.to_string());
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(flag) = &self.cancel_on_call {
            flag.store(true, Ordering::SeqCst);
        }

        match self.replies.get(model).cloned().unwrap_or(MockReply::NotFound) {
            MockReply::Text(text) => Ok(text),
            MockReply::NotFound => Err(AiError::ModelNotFound {
                model: model.to_string(),
                message: format!("models/{model} is not found for API version v1beta"),
            }),
            MockReply::RateLimited => Err(AiError::RateLimited {
                model: model.to_string(),
                message: "Resource has been exhausted".to_string(),
            }),
            MockReply::Fatal(message) => Err(AiError::Api {
                status: 400,
                message,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

enum StoreMode {
    Ok(String),
    Unconfigured,
    DatabaseNotFound,
}

pub struct MockStore {
    mode: StoreMode,
    created: Mutex<Vec<(AnalysisReport, Vec<SearchResult>)>>,
}

impl MockStore {
    /// Accepts every report and answers with `url`.
    pub fn new(url: &str) -> Self {
        Self::with_mode(StoreMode::Ok(url.to_string()))
    }

    /// No database id configured.
    pub fn unconfigured() -> Self {
        Self::with_mode(StoreMode::Unconfigured)
    }

    /// Database id set, but the database cannot be found.
    pub fn database_not_found() -> Self {
        Self::with_mode(StoreMode::DatabaseNotFound)
    }

    fn with_mode(mode: StoreMode) -> Self {
        Self {
            mode,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<(AnalysisReport, Vec<SearchResult>)> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportStore for MockStore {
    fn ensure_configured(&self) -> Result<()> {
        match self.mode {
            StoreMode::Unconfigured => Err(SerpscopeError::Config(
                "DATABASE_ID is not configured".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn create_report(
        &self,
        report: &AnalysisReport,
        sources: &[SearchResult],
    ) -> Result<String> {
        self.ensure_configured()?;
        match &self.mode {
            StoreMode::Ok(url) => {
                if let Ok(mut created) = self.created.lock() {
                    created.push((report.clone(), sources.to_vec()));
                }
                Ok(url.clone())
            }
            StoreMode::DatabaseNotFound => Err(SerpscopeError::DatabaseNotFound),
            StoreMode::Unconfigured => Err(SerpscopeError::Config(
                "DATABASE_ID is not configured".to_string(),
            )),
        }
    }
}
