use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotionError>;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Network error: {0}")]
    Network(String),

    /// Structured error body returned by the Notion API.
    #[error("API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl NotionError {
    /// The database or page does not exist, or the integration was not
    /// invited to it. Notion reports both the same way.
    pub fn is_object_not_found(&self) -> bool {
        matches!(self, NotionError::Api { code, .. } if code == "object_not_found")
    }
}

impl From<reqwest::Error> for NotionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NotionError::Parse(err.to_string())
        } else {
            NotionError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NotionError {
    fn from(err: serde_json::Error) -> Self {
        NotionError::Parse(err.to_string())
    }
}
