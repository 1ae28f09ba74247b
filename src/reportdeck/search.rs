//! # Search Coordinator
//!
//! Decouples keystroke frequency from query propagation. The input's value
//! updates on every keystroke; the query only reaches `on_search` once the
//! value has been stable for the debounce period.
//!
//! Clearing is the exception: it propagates the empty query immediately and
//! drops whatever was pending, so typing then clearing yields a single call.
//!
//! Dropping the coordinator cancels its pending timer, so no callback runs
//! after the owning widget is gone.

use crate::repository::ReportRepository;
use crate::store::ReportStore;
use crate::timer::{Timer, TimerState};
use std::sync::Arc;
use std::time::Duration;

type SearchCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub struct SearchCoordinator {
    value: String,
    debounce: Duration,
    on_search: SearchCallback,
    timer: Timer,
}

impl SearchCoordinator {
    pub fn new<F>(debounce: Duration, on_search: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            value: String::new(),
            debounce,
            on_search: Arc::new(on_search),
            timer: Timer::new("search-debounce"),
        }
    }

    /// Coordinator whose settled queries go to [`ReportStore::set_search_query`].
    pub fn for_store<R: ReportRepository>(store: &ReportStore<R>, debounce: Duration) -> Self {
        let store = store.clone();
        Self::new(debounce, move |query| store.set_search_query(query))
    }

    /// The value bound to the input. Always the latest keystroke.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn on_value_change(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.value {
            return;
        }
        self.value = value.clone();

        let on_search = Arc::clone(&self.on_search);
        self.timer.schedule(self.debounce, move || {
            tracing::debug!(query = %value, "propagating search query");
            on_search(&value);
        });
    }

    pub fn on_clear(&mut self) {
        self.timer.cancel();
        self.value.clear();
        tracing::debug!("search cleared");
        (self.on_search)("");
    }

    pub fn has_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }
}
