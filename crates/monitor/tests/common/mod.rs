#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use jobwatch_core::JobRecord;
use jobwatch_monitor::ScheduleSettings;
use jobwatch_notify::{DeliveryError, Notifier};
use jobwatch_sources::{JobSource, SourceError};
use jobwatch_storage::{LinkStore, StoreError};

pub fn job(link: &str, title: &str) -> JobRecord {
    JobRecord::new(link, title, "")
}

pub fn settings() -> ScheduleSettings {
    ScheduleSettings {
        poll_interval: Duration::from_secs(60),
        sleep_hour: 23,
        sleep_duration: Duration::from_secs(7 * 3600),
        source_timeout: Duration::from_secs(30),
    }
}

/// Returns a fixed batch and counts calls.
pub struct StubSource {
    pub name: String,
    pub jobs: Vec<JobRecord>,
    pub calls: Arc<AtomicUsize>,
    pub should_fail: bool,
    pub delay: Option<Duration>,
    /// Return one new link per call instead of `jobs`.
    pub fresh: bool,
}

impl StubSource {
    pub fn new(name: &str, jobs: Vec<JobRecord>) -> Self {
        Self {
            name: name.to_string(),
            jobs,
            calls: Arc::new(AtomicUsize::new(0)),
            should_fail: false,
            delay: None,
            fresh: false,
        }
    }

    pub fn fresh(name: &str) -> Self {
        Self {
            fresh: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl JobSource for StubSource {
    async fn fetch(&self) -> Result<Vec<JobRecord>, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(SourceError::Other("stub failure".to_string()));
        }
        if self.fresh {
            return Ok(vec![job(&format!("{}-{call}", self.name), "Engineer")]);
        }
        Ok(self.jobs.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Records every batch it receives.
pub struct RecordingNotifier {
    pub name: String,
    pub batches: Arc<Mutex<Vec<Vec<JobRecord>>>>,
    pub should_fail: bool,
    pub delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batches: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(name: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(name)
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Vec<JobRecord>>>> {
        self.batches.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, batch: &[JobRecord]) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.batches.lock().unwrap().push(batch.to_vec());
        if self.should_fail {
            return Err(DeliveryError::Api("stub failure".to_string()));
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        &self.name
    }
}

pub fn links_of(batches: &Arc<Mutex<Vec<Vec<JobRecord>>>>) -> Vec<Vec<String>> {
    batches
        .lock()
        .unwrap()
        .iter()
        .map(|b| b.iter().map(|j| j.link.clone()).collect())
        .collect()
}

/// A store whose reads or writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub links: Mutex<HashSet<String>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub appends: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl LinkStore for FlakyStore {
    async fn load_all(&self) -> Result<HashSet<String>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Other("unreadable".to_string()));
        }
        Ok(self.links.lock().unwrap().clone())
    }

    async fn append_links(&self, links: &[String]) -> Result<(), StoreError> {
        self.appends.lock().unwrap().push(links.to_vec());
        if self.fail_writes {
            return Err(StoreError::Other("disk full".to_string()));
        }
        self.links.lock().unwrap().extend(links.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "flaky".to_string()
    }
}
