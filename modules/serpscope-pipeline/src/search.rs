use async_trait::async_trait;
use serper_client::{SearchRequest, SerperClient, SerperError};
use tracing::info;

use serpscope_common::{
    Config, Result, SearchResponse, SearchResult, SerpscopeError, MAX_SEARCH_RESULTS,
};

use crate::traits::WebSearcher;

/// Query stage backed by Serper's Google search endpoint.
pub struct SerperSearcher {
    client: SerperClient,
    gl: String,
    hl: String,
    num: u32,
}

impl SerperSearcher {
    pub fn new(client: SerperClient, gl: &str, hl: &str, num: u32) -> Self {
        Self {
            client,
            gl: gl.to_string(),
            hl: hl.to_string(),
            num,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SerperClient::new(&config.serper_api_key),
            &config.search_gl,
            &config.search_hl,
            config.search_num,
        )
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, topic: &str) -> Result<SearchResponse> {
        let request = SearchRequest {
            q: topic.to_string(),
            gl: self.gl.clone(),
            hl: self.hl.clone(),
            num: self.num,
        };

        let response = self.client.search(&request).await.map_err(|e| match e {
            SerperError::MissingApiKey => {
                SerpscopeError::Config("SERPER_API_KEY is not configured".to_string())
            }
            other => SerpscopeError::upstream("Search", other),
        })?;

        let converted = convert_response(response);
        info!(
            topic,
            results = converted.organic.len(),
            has_summary = converted.summary.is_some(),
            "Query stage complete"
        );
        Ok(converted)
    }
}

fn convert_response(response: serper_client::SearchResponse) -> SearchResponse {
    let summary = response.summary().map(str::to_string);
    let organic = response
        .organic
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|r| SearchResult {
            title: r.title,
            link: r.link,
            snippet: r.snippet,
        })
        .collect();
    SearchResponse { organic, summary }
}
