//! The monitoring round and the scheduler that drives it.
//!
//! A round polls every source concurrently, filters the merged postings
//! (excluded titles first, then novelty), dispatches the surviving batch,
//! and records the new links. Exactly one timer is armed at a time: the
//! recurring round timer while [`ScheduleMode::Active`], or the one-shot
//! resume timer while [`ScheduleMode::Sleeping`]. The recurring task hands
//! over to the resume timer under the scheduler lock, so a `stop()` racing
//! the hand-off always wins.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use jobwatch_core::filter::{filter_excluded_titles, filter_novel};
use jobwatch_core::{FilterCriteria, JobRecord, LinkSet};
use jobwatch_notify::{Dispatcher, Notifier};
use jobwatch_sources::{JobSource, SourceError};
use jobwatch_storage::LinkStore;

use crate::clock::{Clock, SystemClock};
use crate::error::MonitorError;
use crate::report::{RoundReport, SourceFailure};
use crate::schedule::{ScheduleMode, ScheduleSettings, TimerKind};

// ── Builder ──────────────────────────────────────────────────────────

/// Fluent builder for a [`MonitorOrchestrator`].
pub struct MonitorBuilder {
    settings: ScheduleSettings,
    criteria: FilterCriteria,
    sources: Vec<Box<dyn JobSource>>,
    notifiers: Vec<Box<dyn Notifier>>,
    clock: Arc<dyn Clock>,
}

impl MonitorBuilder {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self {
            settings,
            criteria: FilterCriteria::default(),
            sources: Vec::new(),
            notifiers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn source(mut self, source: impl JobSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn sources(mut self, sources: Vec<Box<dyn JobSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn notifiers(mut self, notifiers: Vec<Box<dyn Notifier>>) -> Self {
        self.notifiers.extend(notifiers);
        self
    }

    /// Override the clock used for the quiet-window check.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the known links from `store` and assemble the orchestrator.
    ///
    /// An unreadable store is not fatal: the monitor starts with an empty
    /// set and every posting of the first round is treated as new.
    pub async fn build(self, store: Arc<dyn LinkStore>) -> MonitorOrchestrator {
        let links = match store.load_all().await {
            Ok(links) => {
                info!(store = %store.describe(), known = links.len(), "loaded known links");
                LinkSet::from(links)
            }
            Err(e) => {
                warn!(
                    store = %store.describe(),
                    error = %e,
                    "failed to load known links, starting with an empty set"
                );
                LinkSet::new()
            }
        };

        MonitorOrchestrator {
            inner: Arc::new(Inner {
                sources: self.sources,
                dispatcher: Dispatcher::new(self.notifiers),
                store,
                criteria: self.criteria,
                settings: self.settings,
                clock: self.clock,
                links: tokio::sync::Mutex::new(links),
                fatal: watch::channel(None).0,
                scheduler: Mutex::new(SchedulerState {
                    mode: ScheduleMode::Active,
                    timer: None,
                    next_epoch: 0,
                }),
            }),
        }
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Polls sources, filters, notifies, and records links on a schedule.
///
/// Cloning is cheap and every clone controls the same monitor.
#[derive(Clone)]
pub struct MonitorOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    sources: Vec<Box<dyn JobSource>>,
    dispatcher: Dispatcher,
    store: Arc<dyn LinkStore>,
    criteria: FilterCriteria,
    settings: ScheduleSettings,
    clock: Arc<dyn Clock>,
    /// Held for a whole round, so rounds never overlap.
    links: tokio::sync::Mutex<LinkSet>,
    /// Set once the scheduler can no longer arm timers.
    fatal: watch::Sender<Option<String>>,
    scheduler: Mutex<SchedulerState>,
}

struct SchedulerState {
    mode: ScheduleMode,
    timer: Option<Timer>,
    next_epoch: u64,
}

/// Handle to the single armed timer task.
struct Timer {
    /// Identifies this arming; a task whose epoch is no longer current
    /// must not touch scheduler state.
    epoch: u64,
    kind: TimerKind,
    cancel: Arc<Notify>,
    _task: JoinHandle<()>,
}

impl MonitorOrchestrator {
    pub fn builder(settings: ScheduleSettings) -> MonitorBuilder {
        MonitorBuilder::new(settings)
    }

    /// Begin monitoring: run a round now, then every poll interval.
    ///
    /// Calling `start` while a timer is already armed (recurring or resume)
    /// does nothing. Fails when the schedule settings are unusable or no
    /// Tokio runtime is available to host the timer.
    pub fn start(&self) -> Result<(), MonitorError> {
        self.inner.settings.validate()?;
        let mut state = self.lock_scheduler();
        if let Some(timer) = &state.timer {
            debug!(timer = ?timer.kind, mode = %state.mode, "monitor already running");
            return Ok(());
        }

        info!(
            sources = self.inner.sources.len(),
            channels = self.inner.dispatcher.len(),
            interval_secs = self.inner.settings.poll_interval.as_secs(),
            sleep_hour = self.inner.settings.sleep_hour,
            "starting job monitoring"
        );
        state.mode = ScheduleMode::Active;
        let timer = self.arm(&mut state, TimerKind::Recurring)?;
        state.timer = Some(timer);
        Ok(())
    }

    /// Cancel whichever timer is armed. A round already in flight runs to
    /// completion. Without an armed timer this is a no-op.
    pub fn stop(&self) {
        let mut state = self.lock_scheduler();
        match state.timer.take() {
            Some(timer) => {
                timer.cancel.notify_one();
                info!(timer = ?timer.kind, "job monitoring stopped");
            }
            None => debug!("monitor not running, nothing to stop"),
        }
    }

    /// Stop the timer, then wait for a round in flight to finish so its
    /// links are persisted before the caller exits.
    pub async fn shutdown(&self) {
        self.stop();
        let _drained = self.inner.links.lock().await;
        debug!("no round in flight, shutdown complete");
    }

    /// Resolves with the error that left the monitor without a timer.
    pub async fn fatal_error(&self) -> MonitorError {
        let mut rx = self.inner.fatal.subscribe();
        let message = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone().unwrap_or_default(),
            Err(_) => "scheduler state dropped".to_string(),
        };
        MonitorError::Scheduler(message)
    }

    pub fn mode(&self) -> ScheduleMode {
        self.lock_scheduler().mode
    }

    /// Kind of the armed timer, or `None` when stopped.
    pub fn armed_timer(&self) -> Option<TimerKind> {
        self.lock_scheduler().timer.as_ref().map(|t| t.kind)
    }

    pub fn is_running(&self) -> bool {
        self.armed_timer().is_some()
    }

    /// Number of links currently known to be notified.
    pub async fn known_links(&self) -> usize {
        self.inner.links.lock().await.len()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.inner.dispatcher.channel_names()
    }

    /// Run one full round: poll, filter, dispatch, record.
    ///
    /// Never fails as a whole. Source, channel, and store failures are
    /// logged once and reported in the returned [`RoundReport`].
    pub async fn check_and_notify(&self) -> RoundReport {
        let mut known = self.inner.links.lock().await;
        self.run_round(&mut known).await
    }

    async fn run_round(&self, known: &mut LinkSet) -> RoundReport {
        let inner = &self.inner;
        info!(sources = inner.sources.len(), "checking for new job postings");

        let (fetched, failures) = self.poll_sources().await;
        let mut report = RoundReport {
            sources_polled: inner.sources.len(),
            failures,
            fetched: fetched.len(),
            ..RoundReport::default()
        };

        let titled = filter_excluded_titles(fetched, &inner.criteria.excluded_titles);
        let batch = filter_novel(titled, known);
        if batch.is_empty() {
            info!("no new job postings");
            report.log_summary();
            return report;
        }

        info!(count = batch.len(), "found new job postings");
        report.deliveries = inner.dispatcher.dispatch(&batch).await;

        let added = known.merge_records(&batch);
        report.recorded = added.len();
        if !added.is_empty() {
            if let Err(e) = inner.store.append_links(&added).await {
                error!(
                    store = %inner.store.describe(),
                    error = %e,
                    links = added.len(),
                    "failed to persist new links, keeping them in memory only"
                );
                report.store_error = Some(e.to_string());
            }
        }

        report.new_jobs = batch;
        report.log_summary();
        report
    }

    /// Fetch from every source concurrently.
    ///
    /// Each fetch is bounded by the source timeout. A failed, timed-out, or
    /// panicking source contributes nothing and is logged once.
    pub async fn poll_sources(&self) -> (Vec<JobRecord>, Vec<SourceFailure>) {
        let timeout = self.inner.settings.source_timeout;

        let fetches = self.inner.sources.iter().map(|source| async move {
            let start = Instant::now();
            let fetch = AssertUnwindSafe(source.fetch()).catch_unwind();
            let result = match tokio::time::timeout(timeout, fetch).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(SourceError::Panicked),
                Err(_) => Err(SourceError::Timeout(timeout.as_secs())),
            };
            (source.name(), result, start.elapsed())
        });

        let mut jobs = Vec::new();
        let mut failures = Vec::new();
        for (name, result, elapsed) in futures::future::join_all(fetches).await {
            match result {
                Ok(batch) => {
                    debug!(
                        source = name,
                        count = batch.len(),
                        duration_ms = elapsed.as_millis() as u64,
                        "source fetched"
                    );
                    jobs.extend(batch);
                }
                Err(e) => {
                    warn!(source = name, error = %e, "source failed, skipping this round");
                    failures.push(SourceFailure {
                        source: name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        (jobs, failures)
    }

    // ── Scheduler internals ──────────────────────────────────────────

    fn lock_scheduler(&self) -> MutexGuard<'_, SchedulerState> {
        self.inner.scheduler.lock().expect("scheduler lock poisoned")
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock_scheduler()
            .timer
            .as_ref()
            .is_some_and(|t| t.epoch == epoch)
    }

    fn report_fatal(&self, error: &MonitorError) {
        error!(error = %error, "scheduler failed, monitor stopped");
        self.inner.fatal.send_replace(Some(error.to_string()));
    }

    /// Spawn a timer task of `kind` under a fresh epoch.
    fn arm(&self, state: &mut SchedulerState, kind: TimerKind) -> Result<Timer, MonitorError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::Scheduler(format!("no async runtime for timer: {e}")))?;

        state.next_epoch += 1;
        let epoch = state.next_epoch;
        let cancel = Arc::new(Notify::new());
        let this = self.clone();
        let signal = cancel.clone();

        let task = match kind {
            TimerKind::Recurring => runtime.spawn(this.run_recurring(epoch, signal)),
            TimerKind::Resume => runtime.spawn(this.run_resume(epoch, signal)),
        };
        debug!(timer = ?kind, epoch, "timer armed");

        Ok(Timer {
            epoch,
            kind,
            cancel,
            _task: task,
        })
    }

    async fn run_recurring(self, epoch: u64, cancel: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.inner.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.notified() => {
                    debug!(epoch, "recurring timer cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            // Re-checked under the link lock so no round begins after shutdown.
            let mut known = self.inner.links.lock().await;
            if !self.is_current(epoch) {
                debug!(epoch, "timer replaced before round, skipping");
                return;
            }
            self.run_round(&mut known).await;
            drop(known);

            let hour = self.inner.clock.local_hour();
            if self.inner.settings.is_quiet_hour(hour) {
                self.enter_sleep(epoch, hour);
                return;
            }
        }
    }

    /// Swap the recurring timer for the resume timer.
    fn enter_sleep(&self, epoch: u64, hour: u32) {
        let mut state = self.lock_scheduler();
        if !state.timer.as_ref().is_some_and(|t| t.epoch == epoch) {
            debug!(epoch, "monitor stopped during round, not entering quiet window");
            return;
        }

        state.mode = ScheduleMode::Sleeping;
        match self.arm(&mut state, TimerKind::Resume) {
            Ok(timer) => {
                info!(
                    hour,
                    sleep_secs = self.inner.settings.sleep_duration.as_secs(),
                    "quiet window started, pausing checks"
                );
                state.timer = Some(timer);
            }
            Err(e) => {
                state.timer = None;
                drop(state);
                self.report_fatal(&e);
            }
        }
    }

    async fn run_resume(self, epoch: u64, cancel: Arc<Notify>) {
        tokio::select! {
            biased;
            _ = cancel.notified() => {
                debug!(epoch, "resume timer cancelled");
                return;
            }
            _ = tokio::time::sleep(self.inner.settings.sleep_duration) => {}
        }

        let mut state = self.lock_scheduler();
        if !state.timer.as_ref().is_some_and(|t| t.epoch == epoch) {
            return;
        }

        state.mode = ScheduleMode::Active;
        match self.arm(&mut state, TimerKind::Recurring) {
            Ok(timer) => {
                info!("quiet window over, resuming checks");
                state.timer = Some(timer);
            }
            Err(e) => {
                state.timer = None;
                drop(state);
                self.report_fatal(&e);
            }
        }
    }
}
