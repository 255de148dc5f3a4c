//! JobSource trait definition and shared error types.

use async_trait::async_trait;

use jobwatch_core::JobRecord;

/// Errors a source can report for one fetch.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("source panicked during fetch")]
    Panicked,

    #[error("{0}")]
    Other(String),
}

/// A producer of job postings from one origin.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch the postings currently listed by this source.
    async fn fetch(&self) -> Result<Vec<JobRecord>, SourceError>;

    /// Human-readable name for this source (used in logs and reports).
    fn name(&self) -> &str;
}
