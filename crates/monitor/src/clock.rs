//! Wall-clock access for the quiet-window check.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Timelike;

/// Source of the current local hour.
pub trait Clock: Send + Sync {
    /// Hour of day in local time, 0-23.
    fn local_hour(&self) -> u32;
}

/// Reads the host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_hour(&self) -> u32 {
        chrono::Local::now().hour()
    }
}

/// A clock whose hour is set by hand.
#[derive(Debug)]
pub struct ManualClock {
    hour: AtomicU32,
}

impl ManualClock {
    pub fn new(hour: u32) -> Self {
        Self {
            hour: AtomicU32::new(hour),
        }
    }

    pub fn set_hour(&self, hour: u32) {
        self.hour.store(hour, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn local_hour(&self) -> u32 {
        self.hour.load(Ordering::SeqCst)
    }
}
