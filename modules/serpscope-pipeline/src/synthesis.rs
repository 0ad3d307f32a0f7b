use std::sync::Arc;

use anyhow::{anyhow, Result as AnyResult};
use tracing::{error, info, warn};

use serpscope_common::{AnalysisReport, EnrichedResult, Result, SerpscopeError};

use crate::prompt::build_prompt;
use crate::traits::TextGenerator;

/// A report together with the model that produced it.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub model: String,
    pub report: AnalysisReport,
}

/// Synthesis stage: one prompt, tried against an ordered list of candidate
/// models.
///
/// A candidate that reports "not found" or "rate limited" hands over to the
/// next one. Any other failure, including a response that does not parse as
/// a report, ends the stage. Every failure surfaces as
/// [`SerpscopeError::AnalysisFailed`]; the per-model detail only goes to
/// the log.
pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
    models: Vec<String>,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, models: Vec<String>) -> Self {
        Self { generator, models }
    }

    pub async fn synthesize(
        &self,
        topic: &str,
        summary: Option<&str>,
        results: &[EnrichedResult],
    ) -> Result<Synthesis> {
        let prompt = build_prompt(topic, summary, results);
        info!(
            sites = results.len(),
            prompt_chars = prompt.chars().count(),
            candidates = self.models.len(),
            "Analyzing content"
        );

        for model in &self.models {
            info!(model = %model, "Trying model");

            let text = match self.generator.generate_json(model, &prompt).await {
                Ok(text) => text,
                Err(e) if e.is_fallback_eligible() => {
                    warn!(model = %model, error = %e, "Model unavailable, trying next candidate");
                    continue;
                }
                Err(e) => {
                    error!(model = %model, error = %e, "Model failed, aborting analysis");
                    return Err(SerpscopeError::AnalysisFailed);
                }
            };

            return match parse_report(&text) {
                Ok(report) => {
                    info!(model = %model, title = %report.title, "Analysis complete");
                    Ok(Synthesis {
                        model: model.clone(),
                        report,
                    })
                }
                Err(e) => {
                    error!(model = %model, error = %e, "Model response is not a valid report");
                    Err(SerpscopeError::AnalysisFailed)
                }
            };
        }

        error!(candidates = ?self.models, "All candidate models failed");
        Err(SerpscopeError::AnalysisFailed)
    }
}

/// Parse a raw model response into a report.
pub fn parse_report(text: &str) -> AnyResult<AnalysisReport> {
    let value = ai_client::util::parse_model_json(text)?;
    if !value.is_object() {
        return Err(anyhow!("expected a JSON object, got {}", value));
    }
    let report: AnalysisReport = serde_json::from_value(value)?;

    let missing = report.missing_fields();
    if !missing.is_empty() {
        warn!(?missing, "Report is missing fields");
    }
    Ok(report)
}
