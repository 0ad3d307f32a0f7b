pub mod error;
pub mod types;

pub use error::{Result, SerperError};
pub use types::{AnswerBox, KnowledgeGraph, OrganicResult, SearchRequest, SearchResponse};

const BASE_URL: &str = "https://google.serper.dev";

pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Run one Google search. No retry; any failure is returned to the caller.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if self.api_key.trim().is_empty() {
            return Err(SerperError::MissingApiKey);
        }

        tracing::info!(query = %request.q, gl = %request.gl, num = request.num, "Serper search");

        let url = format!("{}/search", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerperError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let data: SearchResponse = serde_json::from_str(&body)?;

        tracing::info!(
            query = %request.q,
            count = data.organic.len(),
            has_summary = data.summary().is_some(),
            "Serper search complete"
        );
        Ok(data)
    }
}
