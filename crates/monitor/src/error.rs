/// Errors raised by the monitor itself.
///
/// Source, notifier, and store failures never surface here; they are
/// isolated inside a round and reported through [`crate::RoundReport`].
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("invalid schedule settings: {0}")]
    Settings(String),
}
