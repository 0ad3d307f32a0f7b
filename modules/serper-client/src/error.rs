use thiserror::Error;

pub type Result<T> = std::result::Result<T, SerperError>;

#[derive(Debug, Error)]
pub enum SerperError {
    #[error("Serper API key is not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SerperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SerperError::Parse(err.to_string())
        } else {
            SerperError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SerperError {
    fn from(err: serde_json::Error) -> Self {
        SerperError::Parse(err.to_string())
    }
}
