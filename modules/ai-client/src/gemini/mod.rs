mod client;
pub(crate) mod types;

use crate::error::{AiError, Result};

use client::GeminiClient;
use types::GenerateContentRequest;

// =============================================================================
// Gemini
// =============================================================================

/// Handle to the Gemini API. The model is chosen per call so one handle can
/// walk a list of candidate models.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    http: reqwest::Client,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Generate with structured-output mode on, so the model is constrained
    /// to emit JSON. The raw text is returned; callers still validate it.
    pub async fn generate_json(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::user(prompt).json_output();
        let response = self.client().generate_content(model, &request).await?;
        response.text().ok_or_else(|| AiError::EmptyResponse {
            model: model.to_string(),
            reason: response.empty_reason(),
        })
    }
}
