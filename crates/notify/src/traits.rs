//! Notifier trait definition and shared error types.

use jobwatch_core::JobRecord;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel API error: {0}")]
    Api(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notifier panicked during delivery")]
    Panicked,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a batch of postings through this channel.
    ///
    /// An empty batch must be accepted without error.
    async fn deliver(&self, batch: &[JobRecord]) -> Result<(), DeliveryError>;

    /// Test connectivity with a sample posting.
    async fn test(&self) -> Result<(), DeliveryError> {
        let sample = JobRecord::new(
            "https://example.com/jobs/test",
            "[TEST] jobwatch notification test",
            "This is a test notification from jobwatch.",
        );
        self.deliver(std::slice::from_ref(&sample)).await
    }

    /// Human-readable name for this channel (e.g., "telegram", "console").
    fn channel_name(&self) -> &str;
}

/// Result of dispatching a batch to a single channel.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub channel: String,
    pub batch_size: usize,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
