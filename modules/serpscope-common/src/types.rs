use serde::{Deserialize, Deserializer, Serialize};

/// Organic search results kept per request.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Upper bound on scraped text per page, in characters.
pub const MAX_PAGE_CHARS: usize = 5000;

// --- Query stage ---

/// One ranked organic result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Query stage output: rank-ordered results plus the optional answer-box /
/// knowledge-graph summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub organic: Vec<SearchResult>,
    pub summary: Option<String>,
}

// --- Retrieval stage ---

/// A search result with its scraped page text. `content` is `None` when the
/// fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub result: SearchResult,
    pub content: Option<String>,
}

// --- Synthesis stage ---

/// Structured analysis returned by the language model.
///
/// Parsing is lenient: absent fields are empty strings and non-string values
/// are flattened to text, since the model is not guaranteed to honor the
/// requested shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub intent: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub keywords: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub logic: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub links: String,
}

impl AnalysisReport {
    /// Names of the six report fields that came back empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("target", &self.target),
            ("intent", &self.intent),
            ("keywords", &self.keywords),
            ("logic", &self.logic),
            ("content", &self.content),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
