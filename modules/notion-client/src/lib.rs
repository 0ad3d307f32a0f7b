pub mod error;
pub mod types;

pub use error::{NotionError, Result};
pub use types::{
    Block, BlockBody, CreatePageRequest, Page, Parent, PropertyValue, RichText, TextBlock,
    TextContent,
};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use types::ErrorBody;

const BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| NotionError::Network(format!("invalid token header: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Create a page (a database row when the parent is a database).
    pub async fn create_page(&self, request: &CreatePageRequest) -> Result<Page> {
        let url = format!("{}/pages", self.base_url);

        tracing::debug!(
            database_id = %request.parent.database_id,
            properties = request.properties.len(),
            children = request.children.len(),
            "Notion create page"
        );

        let resp = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let body = resp.text().await?;
        let page: Page = serde_json::from_str(&body)?;
        tracing::info!(page_id = %page.id, "Notion page created");
        Ok(page)
    }
}

fn api_error(status: u16, body: &str) -> NotionError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => NotionError::Api {
            status,
            code: parsed.code,
            message: parsed.message,
        },
        Err(_) => NotionError::Api {
            status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}
