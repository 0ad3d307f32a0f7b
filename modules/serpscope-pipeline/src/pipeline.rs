use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use serpscope_common::config::DEFAULT_GEMINI_MODELS;
use serpscope_common::{AnalysisReport, Result, SerpscopeError};

use crate::retrieval::retrieve;
use crate::synthesis::Synthesizer;
use crate::traits::{PageScraper, ReportStore, TextGenerator, WebSearcher};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Searching,
    Scraping,
    Synthesizing,
    Persisting,
    Done,
    Failed,
}

impl PipelineState {
    fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Searching),
            Self::Searching => Some(Self::Scraping),
            Self::Scraping => Some(Self::Synthesizing),
            Self::Synthesizing => Some(Self::Persisting),
            Self::Persisting => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Forward by exactly one step, or to `Failed` from any active state.
    pub fn can_transition_to(self, next: Self) -> bool {
        match next {
            Self::Failed => self != Self::Idle && !self.is_terminal(),
            _ => self.successor() == Some(next),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Scraping => "scraping",
            Self::Synthesizing => "synthesizing",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-run state tracker. Each run owns one; nothing is shared across runs.
struct RunTracker {
    state: PipelineState,
    history: Vec<PipelineState>,
    entered: Instant,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            entered: Instant::now(),
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(
            from = %self.state,
            to = %next,
            elapsed_ms = self.entered.elapsed().as_millis() as u64,
            "Pipeline transition"
        );
        self.state = next;
        self.history.push(next);
        self.entered = Instant::now();
    }

    /// Record a failure in the current stage and hand the error back.
    fn fail(&mut self, err: SerpscopeError) -> SerpscopeError {
        if self.state.can_transition_to(PipelineState::Failed) {
            if err.is_cancelled() {
                info!(state = %self.state, "Pipeline cancelled");
            } else {
                warn!(state = %self.state, error = %err, "Pipeline failed");
            }
            self.advance(PipelineState::Failed);
        }
        err
    }

    /// Advisory cancellation checkpoint. In-flight calls are never
    /// interrupted; the flag is only read here.
    fn checkpoint(&mut self, cancel: &AtomicBool) -> Result<()> {
        if cancel.load(Ordering::Relaxed) {
            return Err(self.fail(SerpscopeError::Cancelled));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Service handles the pipeline runs against.
#[derive(Clone, TypedBuilder)]
pub struct PipelineDeps {
    pub searcher: Arc<dyn WebSearcher>,
    pub scraper: Arc<dyn PageScraper>,
    pub generator: Arc<dyn TextGenerator>,
    pub store: Arc<dyn ReportStore>,
    #[builder(default = DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect())]
    pub models: Vec<String>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    /// URL of the created record, exactly as the store returned it.
    pub url: String,
    pub model: String,
    pub report: AnalysisReport,
    pub states: Vec<PipelineState>,
}

/// Search → scrape → analyze → persist, strictly in that order.
pub struct Pipeline {
    searcher: Arc<dyn WebSearcher>,
    scraper: Arc<dyn PageScraper>,
    synthesizer: Synthesizer,
    store: Arc<dyn ReportStore>,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            searcher: deps.searcher,
            scraper: deps.scraper,
            synthesizer: Synthesizer::new(deps.generator, deps.models),
            store: deps.store,
        }
    }

    /// Run the pipeline for one topic.
    ///
    /// `cancel` is checked before synthesis and before persistence. When it
    /// is set at either point the run ends with [`SerpscopeError::Cancelled`]
    /// and completed work is discarded.
    pub async fn run(&self, topic: &str, cancel: &AtomicBool) -> Result<PipelineOutcome> {
        let run_id = Uuid::new_v4();
        self.execute(run_id, topic, cancel)
            .instrument(info_span!("pipeline", %run_id))
            .await
    }

    async fn execute(&self, run_id: Uuid, topic: &str, cancel: &AtomicBool) -> Result<PipelineOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SerpscopeError::InvalidInput("Prompt is required".to_string()));
        }

        // The database id is known before any paid call is made.
        self.store.ensure_configured()?;

        let mut tracker = RunTracker::new();

        tracker.advance(PipelineState::Searching);
        info!(topic, "Starting search");
        let search = self
            .searcher
            .search(topic)
            .await
            .map_err(|e| tracker.fail(e))?;
        if search.organic.is_empty() {
            warn!(topic, "Search returned no organic results");
        }

        tracker.advance(PipelineState::Scraping);
        let enriched = retrieve(self.scraper.as_ref(), &search.organic).await;

        tracker.checkpoint(cancel)?;
        tracker.advance(PipelineState::Synthesizing);
        let synthesis = self
            .synthesizer
            .synthesize(topic, search.summary.as_deref(), &enriched)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.checkpoint(cancel)?;
        tracker.advance(PipelineState::Persisting);
        let url = self
            .store
            .create_report(&synthesis.report, &search.organic)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.advance(PipelineState::Done);
        info!(url = %url, model = %synthesis.model, "Pipeline complete");

        Ok(PipelineOutcome {
            run_id,
            url,
            model: synthesis.model,
            report: synthesis.report,
            states: tracker.history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        report_json, sample_report, search_results, MockGenerator, MockReply, MockScraper,
        MockSearcher, MockStore,
    };
    use serpscope_common::SearchResponse;

    const ALL_MODELS: &[&str] = &[
        "gemini-flash-latest",
        "gemini-2.0-flash",
        "gemini-2.0-flash-lite",
        "gemini-1.5-flash",
        "gemini-2.5-flash",
    ];

    struct Harness {
        searcher: Arc<MockSearcher>,
        generator: Arc<MockGenerator>,
        store: Arc<MockStore>,
        pipeline: Pipeline,
    }

    fn harness(scraper: MockScraper, generator: MockGenerator, store: MockStore) -> Harness {
        let searcher = Arc::new(MockSearcher::new(SearchResponse {
            organic: search_results(5),
            summary: Some("Runners compare cushioning.".into()),
        }));
        let generator = Arc::new(generator);
        let store = Arc::new(store);
        let pipeline = Pipeline::new(
            PipelineDeps::builder()
                .searcher(searcher.clone())
                .scraper(Arc::new(scraper))
                .generator(generator.clone())
                .store(store.clone())
                .build(),
        );
        Harness {
            searcher,
            generator,
            store,
            pipeline,
        }
    }

    fn three_of_five_pages() -> MockScraper {
        let results = search_results(5);
        MockScraper::new()
            .on_page(&results[0].link, "page one")
            .on_page(&results[2].link, "page three")
            .on_page(&results[4].link, "page five")
    }

    #[test]
    fn transitions_are_strictly_sequential() {
        use PipelineState::*;
        assert!(Idle.can_transition_to(Searching));
        assert!(Searching.can_transition_to(Scraping));
        assert!(Persisting.can_transition_to(Done));
        assert!(!Idle.can_transition_to(Scraping));
        assert!(!Scraping.can_transition_to(Persisting));
        assert!(!Synthesizing.can_transition_to(Synthesizing));
        assert!(!Idle.can_transition_to(Failed));
        assert!(Scraping.can_transition_to(Failed));
        assert!(!Done.can_transition_to(Failed));
        assert!(Done.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use PipelineState::*;
        let all = [Idle, Searching, Scraping, Synthesizing, Persisting, Done, Failed];
        for from in all.into_iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
        for from in [Searching, Scraping, Synthesizing, Persisting] {
            assert!(!from.is_terminal());
            assert!(from.can_transition_to(Failed));
        }
    }

    #[tokio::test]
    async fn partial_scrape_failures_still_produce_record() {
        let h = harness(
            three_of_five_pages(),
            MockGenerator::new().on_model(ALL_MODELS[0], MockReply::Text(report_json("Shoes"))),
            MockStore::new("https://www.notion.so/Shoes-abc123"),
        );
        let cancel = AtomicBool::new(false);
        let outcome = h.pipeline.run("best running shoes 2025", &cancel).await.unwrap();

        assert_eq!(outcome.url, "https://www.notion.so/Shoes-abc123");
        assert_eq!(outcome.model, ALL_MODELS[0]);
        assert_eq!(
            outcome.states,
            vec![
                PipelineState::Idle,
                PipelineState::Searching,
                PipelineState::Scraping,
                PipelineState::Synthesizing,
                PipelineState::Persisting,
                PipelineState::Done,
            ]
        );

        let prompt = h.generator.last_prompt().unwrap();
        for n in 1..=5 {
            assert!(prompt.contains(&format!("[Site {n}]")));
        }
        assert_eq!(prompt.matches("No content available.").count(), 2);
        assert!(prompt.contains("Theme: best running shoes 2025"));
        assert!(prompt.contains("AI Overview: Runners compare cushioning."));

        let created = h.store.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0.title, "Shoes");
        assert_eq!(created[0].1, search_results(5));
    }

    #[tokio::test]
    async fn report_url_round_trips_unchanged() {
        let url = "https://www.notion.so/workspace/Report-0123456789abcdef?pvs=4";
        let h = harness(
            MockScraper::new(),
            MockGenerator::new().on_model(ALL_MODELS[0], MockReply::Text(report_json("R"))),
            MockStore::new(url),
        );
        let outcome = h.pipeline.run("topic", &AtomicBool::new(false)).await.unwrap();
        assert_eq!(outcome.url, url);
        assert_eq!(outcome.report, sample_report("R"));
    }

    #[tokio::test]
    async fn missing_database_id_skips_all_stages() {
        let h = harness(MockScraper::new(), MockGenerator::new(), MockStore::unconfigured());
        let err = h.pipeline.run("topic", &AtomicBool::new(false)).await.unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_ID is not configured");
        assert_eq!(h.searcher.call_count(), 0);
        assert!(h.generator.calls().is_empty());
        assert!(h.store.created().is_empty());
    }

    #[tokio::test]
    async fn search_failure_short_circuits() {
        let generator = MockGenerator::new();
        let store = MockStore::new("https://notion.so/x");
        let searcher = Arc::new(MockSearcher::failing("Serper down"));
        let generator = Arc::new(generator);
        let store = Arc::new(store);
        let pipeline = Pipeline::new(
            PipelineDeps::builder()
                .searcher(searcher.clone())
                .scraper(Arc::new(MockScraper::new()))
                .generator(generator.clone())
                .store(store.clone())
                .build(),
        );
        let err = pipeline.run("topic", &AtomicBool::new(false)).await.unwrap_err();
        assert!(matches!(err, SerpscopeError::Upstream { .. }));
        assert!(generator.calls().is_empty());
        assert!(store.created().is_empty());
    }

    #[tokio::test]
    async fn cancel_during_synthesis_creates_no_record() {
        let cancel = Arc::new(AtomicBool::new(false));
        let h = harness(
            three_of_five_pages(),
            MockGenerator::new()
                .on_model(ALL_MODELS[0], MockReply::Text(report_json("R")))
                .cancel_on_call(cancel.clone()),
            MockStore::new("https://notion.so/x"),
        );
        let err = h.pipeline.run("topic", &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(h.generator.calls().len(), 1);
        assert!(h.store.created().is_empty());
    }

    #[tokio::test]
    async fn cancel_before_synthesis_skips_model() {
        let h = harness(
            MockScraper::new(),
            MockGenerator::new().on_model(ALL_MODELS[0], MockReply::Text(report_json("R"))),
            MockStore::new("https://notion.so/x"),
        );
        let err = h.pipeline.run("topic", &AtomicBool::new(true)).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(h.searcher.call_count(), 1);
        assert!(h.generator.calls().is_empty());
        assert!(h.store.created().is_empty());
    }

    #[tokio::test]
    async fn all_models_not_found_creates_no_record() {
        let h = harness(MockScraper::new(), MockGenerator::new(), MockStore::new("https://notion.so/x"));
        let err = h.pipeline.run("topic", &AtomicBool::new(false)).await.unwrap_err();
        assert!(matches!(err, SerpscopeError::AnalysisFailed));
        assert_eq!(h.generator.calls(), ALL_MODELS.to_vec());
        assert!(h.store.created().is_empty());
    }

    #[tokio::test]
    async fn database_not_found_surfaces_dedicated_error() {
        let h = harness(
            MockScraper::new(),
            MockGenerator::new().on_model(ALL_MODELS[0], MockReply::Text(report_json("R"))),
            MockStore::database_not_found(),
        );
        let err = h.pipeline.run("topic", &AtomicBool::new(false)).await.unwrap_err();
        assert!(matches!(err, SerpscopeError::DatabaseNotFound));
        assert!(err.to_string().contains("integration"));
    }

    #[tokio::test]
    async fn blank_topic_is_rejected() {
        let h = harness(MockScraper::new(), MockGenerator::new(), MockStore::new("u"));
        let err = h.pipeline.run("   ", &AtomicBool::new(false)).await.unwrap_err();
        assert!(matches!(err, SerpscopeError::InvalidInput(_)));
        assert_eq!(h.searcher.call_count(), 0);
    }
}
