// Trait boundaries for the four pipeline stages.
//
// Each external service sits behind one trait so the orchestrator can run
// against MockSearcher / MockScraper / MockGenerator / MockStore in tests:
// no network, no API keys.

use async_trait::async_trait;

use serpscope_common::{AnalysisReport, Result, SearchResponse, SearchResult};

// ---------------------------------------------------------------------------
// WebSearcher: Query stage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Top organic results (at most five, rank order) plus optional summary.
    async fn search(&self, topic: &str) -> Result<SearchResponse>;
}

// ---------------------------------------------------------------------------
// PageScraper: Retrieval stage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch a page and return its visible text. Errors are absorbed by the
    /// caller, so implementations need not be careful about their kind.
    async fn scrape(&self, url: &str) -> anyhow::Result<String>;
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// TextGenerator: Synthesis stage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a JSON-shaped response with the given model id.
    async fn generate_json(&self, model: &str, prompt: &str) -> ai_client::Result<String>;
}

#[async_trait]
impl TextGenerator for ai_client::Gemini {
    async fn generate_json(&self, model: &str, prompt: &str) -> ai_client::Result<String> {
        ai_client::Gemini::generate_json(self, model, prompt).await
    }
}

// ---------------------------------------------------------------------------
// ReportStore: Persistence stage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Fail fast when the destination is not configured. Must not touch the
    /// network.
    fn ensure_configured(&self) -> Result<()>;

    /// Create one new record and return its URL.
    async fn create_report(&self, report: &AnalysisReport, sources: &[SearchResult])
        -> Result<String>;
}
