//! Monitoring loop for job postings.
//!
//! The [`MonitorOrchestrator`] polls every configured source, removes
//! excluded and already-seen postings, fans the remainder out to every
//! notifier, and records the new links. A recurring timer drives rounds
//! and pauses them during a nightly quiet window.

pub mod clock;
pub mod compose;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::MonitorError;
pub use orchestrator::{MonitorBuilder, MonitorOrchestrator};
pub use report::{RoundReport, SourceFailure};
pub use schedule::{ScheduleMode, ScheduleSettings, TimerKind};
