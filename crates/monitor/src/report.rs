//! Outcome of a single monitoring round.

use jobwatch_core::JobRecord;
use jobwatch_notify::DispatchResult;
use tracing::info;

/// A source that failed during a round.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// What happened during one round.
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    pub sources_polled: usize,
    pub failures: Vec<SourceFailure>,
    /// Postings returned by all sources before filtering.
    pub fetched: usize,
    /// Postings that survived filtering and were dispatched.
    pub new_jobs: Vec<JobRecord>,
    pub deliveries: Vec<DispatchResult>,
    /// Links newly added to the known set.
    pub recorded: usize,
    /// Set when persisting the new links failed.
    pub store_error: Option<String>,
}

impl RoundReport {
    pub fn failed_deliveries(&self) -> usize {
        self.deliveries.iter().filter(|d| !d.success).count()
    }

    pub fn log_summary(&self) {
        info!(
            sources = self.sources_polled,
            failed_sources = self.failures.len(),
            fetched = self.fetched,
            new_jobs = self.new_jobs.len(),
            channels = self.deliveries.len(),
            failed_channels = self.failed_deliveries(),
            recorded = self.recorded,
            store_ok = self.store_error.is_none(),
            "round complete"
        );
    }
}
