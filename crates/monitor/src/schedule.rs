//! Scheduling modes and timing settings.

use std::fmt;
use std::time::Duration;

use jobwatch_core::config::MonitorConfig;

use crate::error::MonitorError;

/// What the scheduler is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Rounds run on the recurring interval.
    Active,
    /// Inside the quiet window; only the resume timer is armed.
    Sleeping,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Sleeping => f.write_str("sleeping"),
        }
    }
}

/// The kind of timer currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Recurring,
    Resume,
}

/// Timing knobs for the monitor.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    /// Period between the start of consecutive rounds.
    pub poll_interval: Duration,
    /// Local hour at or after which the quiet window begins.
    pub sleep_hour: u32,
    /// Length of the quiet window.
    pub sleep_duration: Duration,
    /// Upper bound on a single source fetch.
    pub source_timeout: Duration,
}

impl ScheduleSettings {
    /// True when `hour` falls on or after the configured sleep hour.
    pub fn is_quiet_hour(&self, hour: u32) -> bool {
        hour >= self.sleep_hour
    }

    /// Reject settings the timers cannot run with.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.poll_interval.is_zero() {
            return Err(MonitorError::Settings("poll interval must be greater than zero".into()));
        }
        if self.sleep_duration.is_zero() {
            return Err(MonitorError::Settings("sleep duration must be greater than zero".into()));
        }
        if self.source_timeout.is_zero() {
            return Err(MonitorError::Settings("source timeout must be greater than zero".into()));
        }
        if self.sleep_hour > 23 {
            return Err(MonitorError::Settings(format!(
                "sleep hour {} is not between 0 and 23",
                self.sleep_hour
            )));
        }
        Ok(())
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for ScheduleSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: config.check_interval(),
            sleep_hour: config.sleep_hour,
            sleep_duration: config.sleep_duration(),
            source_timeout: config.source_timeout(),
        }
    }
}
