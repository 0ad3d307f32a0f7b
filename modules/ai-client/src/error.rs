use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The model id is unknown or not served for this key / API version.
    #[error("Model {model} not found: {message}")]
    ModelNotFound { model: String, message: String },

    #[error("Model {model} rate limited: {message}")]
    RateLimited { model: String, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model {model} returned no text: {reason}")]
    EmptyResponse { model: String, reason: String },
}

impl AiError {
    /// Errors after which trying a different model id can still succeed.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            AiError::ModelNotFound { .. } | AiError::RateLimited { .. }
        )
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AiError::Parse(e.to_string())
        } else {
            AiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}
