// Request-scoped error taxonomy.
//
// Store and CLI plumbing uses anyhow; anything that can reach an HTTP caller
// is funnelled into CoreError first so the web layer can pick a status code.
// None of these are fatal to the process.

/// Errors surfaced by the recording and aggregation pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed input. Never retried.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer credential.
    #[error("{0}")]
    Auth(String),

    /// Goal configuration that aggregation cannot work with.
    #[error("{0}")]
    Config(String),

    /// Store unavailable, timed out, or kept conflicting after retries.
    #[error("{0}")]
    Persistence(String),

    /// Anything else (upstream identity provider down, serialization bugs).
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        CoreError::Auth(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CoreError::Config(msg.into())
    }

    /// Whether the read-modify-write loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Persistence(_))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Internal(format!("serialization error: {e}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        CoreError::Persistence(format!("{e:#}"))
    }
}
