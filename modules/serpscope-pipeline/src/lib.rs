pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod search;
pub mod store;
pub mod synthesis;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use pipeline::{Pipeline, PipelineDeps, PipelineOutcome, PipelineState};
pub use retrieval::{extract_text, retrieve, HttpScraper};
pub use search::SerperSearcher;
pub use store::NotionReportStore;
pub use synthesis::{Synthesis, Synthesizer};
pub use traits::{PageScraper, ReportStore, TextGenerator, WebSearcher};
