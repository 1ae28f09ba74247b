//! # Report Store
//!
//! The store is the single writer of report-related state. Widgets read it
//! through snapshots and subscriptions; they never mutate it directly.
//!
//! ## Snapshots
//!
//! State lives in an immutable [`ReportState`] behind an `Arc`. Every action
//! builds the next state from the current one, swaps the `Arc`, and then
//! publishes the new snapshot to every subscriber, in commit order. A change
//! that leaves the state identical is not a transition and publishes nothing.
//!
//! ## Construction
//!
//! There is no global instance. A [`ReportStore`] is built around a
//! repository and handed to whatever needs it; clones share the same state.
//!
//! ## Failures
//!
//! Repository failures are caught here and turned into fixed, user-facing
//! messages in [`ReportState::error`]. Neither fetch nor upload retries on
//! its own.
//!
//! ## Listeners
//!
//! Listeners run synchronously inside the commit. They receive the new
//! snapshot and may read the store, but must not call store actions from
//! within the callback.

use crate::config::StoreTiming;
use crate::error::{ReportError, Result};
use crate::model::{Report, UploadFile};
use crate::repository::ReportRepository;
use crate::timer::{Ticker, Timer};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub const FETCH_FAILED: &str = "Failed to fetch reports";
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";

/// Everything the views know about reports at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    /// Most recent upload first, then the order the last fetch returned.
    pub reports: Arc<Vec<Report>>,
    /// Raw query as typed; not trimmed.
    pub search_query: String,
    /// True while at least one fetch or upload is in flight.
    pub is_loading: bool,
    pub error: Option<String>,
    /// Percentage, 0..=100.
    pub upload_progress: u8,
}

type Listener = Arc<dyn Fn(&ReportState) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    /// Explicit form of dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

struct Committed {
    snapshot: Arc<ReportState>,
    in_flight: usize,
}

struct Inner<R> {
    repository: R,
    timing: StoreTiming,
    committed: Mutex<Committed>,
    /// Serialises commit + publish so subscribers see snapshots in commit order.
    publishing: Mutex<()>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    progress_reset: Mutex<Timer>,
}

pub struct ReportStore<R: ReportRepository> {
    inner: Arc<Inner<R>>,
}

impl<R: ReportRepository> Clone for ReportStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R: ReportRepository> ReportStore<R> {
    pub fn new(repository: R, timing: StoreTiming) -> Self {
        Self {
            inner: Arc::new(Inner {
                repository,
                timing,
                committed: Mutex::new(Committed {
                    snapshot: Arc::new(ReportState::default()),
                    in_flight: 0,
                }),
                publishing: Mutex::new(()),
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
                progress_reset: Mutex::new(Timer::new("progress-reset")),
            }),
        }
    }

    pub fn repository(&self) -> &R {
        &self.inner.repository
    }

    pub fn timing(&self) -> StoreTiming {
        self.inner.timing
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<ReportState> {
        Arc::clone(&lock(&self.inner.committed).snapshot)
    }

    /// Registers `listener` to receive every snapshot committed from now on.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ReportState) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.inner.listeners);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner.listeners),
        }
    }

    /// Replaces the report list with the repository's current contents.
    ///
    /// On failure the list is left untouched and `error` is set to
    /// [`FETCH_FAILED`]; the returned error carries the same message.
    pub async fn fetch_reports(&self) -> Result<()> {
        self.transition(|state, in_flight| {
            *in_flight += 1;
            state.error = None;
        });

        match self.inner.repository.list().await {
            Ok(reports) => {
                tracing::debug!(count = reports.len(), "fetched reports");
                self.transition(move |state, in_flight| {
                    *in_flight = in_flight.saturating_sub(1);
                    state.reports = Arc::new(reports);
                });
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch reports");
                self.transition(|state, in_flight| {
                    *in_flight = in_flight.saturating_sub(1);
                    state.error = Some(FETCH_FAILED.to_string());
                });
                Err(ReportError::Repository(FETCH_FAILED.to_string()))
            }
        }
    }

    /// Uploads `file`, simulating progress while the repository works.
    ///
    /// Progress climbs by `timing.step` every `timing.tick`, never past
    /// `timing.cap`. It only reaches 100 once the repository confirms, and
    /// falls back to 0 after `timing.reset_after`. On rejection the report
    /// list is untouched, progress drops to 0 at once, and the repository's
    /// error is returned.
    ///
    /// The future should be driven to completion; uploads cannot be cancelled.
    pub async fn upload_report(&self, file: &UploadFile) -> Result<Report> {
        lock(&self.inner.progress_reset).cancel();
        self.transition(|state, in_flight| {
            *in_flight += 1;
            state.error = None;
            state.upload_progress = 0;
        });

        let ticker = self.start_progress_ticker();
        let outcome = self.inner.repository.upload(file).await;
        ticker.stop();

        match outcome {
            Ok(report) => {
                tracing::info!(id = report.id, name = %report.name, "report uploaded");
                let added = report.clone();
                self.transition(move |state, in_flight| {
                    *in_flight = in_flight.saturating_sub(1);
                    let mut reports = Vec::with_capacity(state.reports.len() + 1);
                    reports.push(added);
                    reports.extend(state.reports.iter().cloned());
                    state.reports = Arc::new(reports);
                    state.upload_progress = 100;
                    state.error = None;
                });
                self.schedule_progress_reset();
                Ok(report)
            }
            Err(err) => {
                tracing::error!(error = %err, file = %file.name, "upload failed");
                self.transition(|state, in_flight| {
                    *in_flight = in_flight.saturating_sub(1);
                    state.error = Some(UPLOAD_FAILED.to_string());
                    state.upload_progress = 0;
                });
                Err(err)
            }
        }
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.transition(move |state, _| state.search_query = query);
    }

    pub fn clear_error(&self) {
        self.transition(|state, _| state.error = None);
    }

    fn start_progress_ticker(&self) -> Ticker {
        let store = self.clone();
        let StoreTiming { tick, step, cap, .. } = self.inner.timing;
        Ticker::start("upload-progress", tick, move || {
            store.transition(|state, _| {
                state.upload_progress = state.upload_progress.saturating_add(step).min(cap);
            });
        })
    }

    fn schedule_progress_reset(&self) {
        let store = self.clone();
        lock(&self.inner.progress_reset).schedule(self.inner.timing.reset_after, move || {
            store.transition(|state, _| state.upload_progress = 0);
        });
    }

    /// Applies `change` to a copy of the current state and publishes the
    /// result if it differs. `is_loading` is always recomputed from the
    /// in-flight counter.
    fn transition<F>(&self, change: F)
    where
        F: FnOnce(&mut ReportState, &mut usize),
    {
        let _publishing = lock(&self.inner.publishing);

        let next = {
            let mut committed = lock(&self.inner.committed);
            let mut next = ReportState::clone(&committed.snapshot);
            change(&mut next, &mut committed.in_flight);
            next.is_loading = committed.in_flight > 0;
            if next == *committed.snapshot {
                return;
            }
            let next = Arc::new(next);
            committed.snapshot = Arc::clone(&next);
            next
        };

        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportKind;
    use crate::repository::mock::seed_reports;
    use crate::test_utils::{wait_ms, ScriptedRepository, StateLog};
    use std::time::Duration;

    fn store(repo: ScriptedRepository) -> ReportStore<ScriptedRepository> {
        ReportStore::new(repo, StoreTiming::default())
    }

    fn motor_vibe() -> UploadFile {
        UploadFile::from_metadata("motor_vibe.pdf", "application/pdf", 3 * 1024 * 1024)
    }

    fn motor_vibe_report() -> Report {
        Report::new(99, "motor_vibe.pdf", "3.0MB", ReportKind::Vibration, "2024-01-01")
    }

    #[tokio::test(start_paused = true)]
    async fn starts_empty() {
        let store = store(ScriptedRepository::new());
        assert_eq!(*store.snapshot(), ReportState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_success_replaces_reports() {
        let repo = ScriptedRepository::new().list_ok(seed_reports());
        let store = store(repo);

        store.fetch_reports().await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.reports.len(), 2);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_is_loading_while_in_flight() {
        let repo = ScriptedRepository::new()
            .with_list_latency(Duration::from_millis(500))
            .list_ok(seed_reports());
        let store = store(repo);
        let log = StateLog::attach(&store);

        store.fetch_reports().await.unwrap();

        let states = log.states();
        assert_eq!(states.len(), 2);
        assert!(states[0].is_loading);
        assert!(states[0].reports.is_empty());
        assert!(!states[1].is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_keeps_previous_reports() {
        let repo = ScriptedRepository::new()
            .list_ok(seed_reports())
            .list_err("boom");
        let store = store(repo);
        store.fetch_reports().await.unwrap();

        let err = store.fetch_reports().await.unwrap_err();

        assert_eq!(err.to_string(), FETCH_FAILED);
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED));
        assert_eq!(state.reports.len(), 2);
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_on_empty_store_leaves_it_empty() {
        let store = store(ScriptedRepository::new().list_err("boom"));

        assert!(store.fetch_reports().await.is_err());

        assert!(store.snapshot().reports.is_empty());
        assert_eq!(store.snapshot().error.as_deref(), Some(FETCH_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn next_fetch_clears_previous_error() {
        let repo = ScriptedRepository::new()
            .list_err("boom")
            .list_ok(seed_reports());
        let store = store(repo);
        let _ = store.fetch_reports().await;
        let log = StateLog::attach(&store);

        store.fetch_reports().await.unwrap();

        assert_eq!(log.states()[0].error, None);
        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_success_prepends_and_resets_progress() {
        let repo = ScriptedRepository::new()
            .list_ok(seed_reports())
            .with_upload_latency(Duration::from_millis(2000))
            .upload_ok(motor_vibe_report());
        let store = store(repo);
        store.fetch_reports().await.unwrap();
        let log = StateLog::attach(&store);

        let report = store.upload_report(&motor_vibe()).await.unwrap();

        assert_eq!(report, motor_vibe_report());
        let state = store.snapshot();
        assert_eq!(state.reports[0], motor_vibe_report());
        assert_eq!(state.reports.len(), 3);
        assert_eq!(state.upload_progress, 100);
        assert!(!state.is_loading);

        let progress = log.progress();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
        assert!(progress.contains(&90));

        wait_ms(999).await;
        assert_eq!(store.snapshot().upload_progress, 100);
        wait_ms(2).await;
        assert_eq!(store.snapshot().upload_progress, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_never_passes_cap_before_confirmation() {
        let repo = ScriptedRepository::new()
            .with_upload_latency(Duration::from_millis(10_000))
            .upload_ok(motor_vibe_report());
        let store = store(repo);
        let log = StateLog::attach(&store);

        store.upload_report(&motor_vibe()).await.unwrap();

        let progress = log.progress();
        let before_settle = &progress[..progress.len() - 1];
        assert_eq!(before_settle.iter().max(), Some(&90));
        assert!(before_settle.iter().filter(|p| **p == 90).count() == 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_settlement() {
        let repo = ScriptedRepository::new()
            .with_upload_latency(Duration::from_millis(450))
            .upload_ok(motor_vibe_report());
        let store = store(repo);
        let log = StateLog::attach(&store);

        store.upload_report(&motor_vibe()).await.unwrap();
        let settled = log.states().len();

        wait_ms(2000).await;

        let after: Vec<u8> = log.progress()[settled..].to_vec();
        assert_eq!(after, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_failure_sets_error_and_zeroes_progress() {
        let repo = ScriptedRepository::new()
            .list_ok(seed_reports())
            .with_upload_latency(Duration::from_millis(1000))
            .upload_err("Upload failed");
        let store = store(repo);
        store.fetch_reports().await.unwrap();

        let err = store.upload_report(&motor_vibe()).await.unwrap_err();

        assert_eq!(err.to_string(), "Upload failed");
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some(UPLOAD_FAILED));
        assert_eq!(state.upload_progress, 0);
        assert_eq!(state.reports.len(), 2);
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn new_upload_supersedes_pending_progress_reset() {
        let repo = ScriptedRepository::new()
            .with_upload_latency(Duration::from_millis(1000))
            .upload_ok(motor_vibe_report())
            .upload_ok(Report::new(100, "b.pdf", "1.0MB", ReportKind::Thermal, "2024-01-02"));
        let store = store(repo);

        store.upload_report(&motor_vibe()).await.unwrap();
        wait_ms(500).await;

        let log = StateLog::attach(&store);
        store.upload_report(&motor_vibe()).await.unwrap();

        let progress = log.progress();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_spans_overlapping_requests() {
        let repo = ScriptedRepository::new()
            .with_list_latency(Duration::from_millis(300))
            .with_upload_latency(Duration::from_millis(1000))
            .list_ok(seed_reports())
            .upload_ok(motor_vibe_report());
        let store = store(repo);

        let uploader = store.clone();
        let upload = tokio::spawn(async move { uploader.upload_report(&motor_vibe()).await });
        tokio::task::yield_now().await;

        store.fetch_reports().await.unwrap();
        assert!(store.snapshot().is_loading);

        upload.await.unwrap().unwrap();
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn search_query_is_stored_raw() {
        let store = store(ScriptedRepository::new());
        store.set_search_query("  Therm ");
        assert_eq!(store.snapshot().search_query, "  Therm ");
    }

    #[tokio::test(start_paused = true)]
    async fn clear_error_without_error_publishes_nothing() {
        let store = store(ScriptedRepository::new());
        let log = StateLog::attach(&store);

        store.clear_error();

        assert!(log.states().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_error_dismisses_error() {
        let store = store(ScriptedRepository::new().list_err("boom"));
        let _ = store.fetch_reports().await;

        store.clear_error();

        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_are_replaced_not_mutated() {
        let store = store(ScriptedRepository::new());
        let before = store.snapshot();

        store.set_search_query("x");

        assert_eq!(before.search_query, "");
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_subscription_stops_notifications() {
        let store = store(ScriptedRepository::new());
        let log = StateLog::attach(&store);

        store.set_search_query("a");
        log.detach();
        store.set_search_query("b");

        assert_eq!(log.states().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_notifications() {
        let store = store(ScriptedRepository::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |state| {
            sink.lock().unwrap().push(state.search_query.clone());
        });

        store.set_search_query("a");
        subscription.unsubscribe();
        store.set_search_query("b");

        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
    }
}
