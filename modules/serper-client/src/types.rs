use serde::{Deserialize, Serialize};

/// Request body for `POST /search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub q: String,
    /// Country code, e.g. `jp`.
    pub gl: String,
    /// Interface language, e.g. `ja`.
    pub hl: String,
    pub num: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
    #[serde(default)]
    pub answer_box: Option<AnswerBox>,
    #[serde(default)]
    pub knowledge_graph: Option<KnowledgeGraph>,
}

impl SearchResponse {
    /// Short synthesized summary attached to the query, preferring the
    /// answer box over the knowledge graph.
    pub fn summary(&self) -> Option<&str> {
        self.answer_box
            .as_ref()
            .and_then(|a| a.snippet.as_deref())
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.knowledge_graph
                    .as_ref()
                    .and_then(|k| k.description.as_deref())
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerBox {
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub description: Option<String>,
}
