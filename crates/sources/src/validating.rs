//! Description validation applied at the source.

use async_trait::async_trait;
use tracing::{debug, info};

use jobwatch_core::filter::check_description;
use jobwatch_core::{FilterCriteria, JobRecord};

use crate::traits::{JobSource, SourceError};

/// Wraps a source and keeps only postings whose summary passes
/// [`check_description`].
pub struct ValidatingSource<S> {
    inner: S,
    criteria: FilterCriteria,
}

impl<S: JobSource> ValidatingSource<S> {
    pub fn new(inner: S, criteria: FilterCriteria) -> Self {
        Self { inner, criteria }
    }
}

#[async_trait]
impl<S: JobSource> JobSource for ValidatingSource<S> {
    async fn fetch(&self) -> Result<Vec<JobRecord>, SourceError> {
        let fetched = self.inner.fetch().await?;
        let total = fetched.len();

        let kept: Vec<JobRecord> = fetched
            .into_iter()
            .filter(|job| match check_description(&job.summary, &self.criteria) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(source = self.inner.name(), link = %job.link, %reason, "posting rejected");
                    false
                }
            })
            .collect();

        info!(
            source = self.inner.name(),
            fetched = total,
            kept = kept.len(),
            "description validation applied"
        );
        Ok(kept)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
