use thiserror::Error;

pub type Result<T> = std::result::Result<T, SerpscopeError>;

#[derive(Error, Debug)]
pub enum SerpscopeError {
    /// Missing credentials or identifiers. The message is shown to the user
    /// as-is.
    #[error("{0}")]
    Config(String),

    /// The request itself is unusable (e.g. a blank topic).
    #[error("{0}")]
    InvalidInput(String),

    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Analysis failed: the AI model could not produce a report. Please wait a moment and try again.")]
    AnalysisFailed,

    #[error("Notion database not found. Check that the database ID is correct and that the integration has been invited to the database.")]
    DatabaseNotFound,

    #[error("Request cancelled by client")]
    Cancelled,
}

impl SerpscopeError {
    pub fn upstream(service: &'static str, err: impl std::fmt::Display) -> Self {
        SerpscopeError::Upstream {
            service,
            message: err.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SerpscopeError::Cancelled)
    }
}
