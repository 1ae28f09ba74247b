//! # Scheduled Tasks
//!
//! Debouncing, progress simulation and the various auto-resets are all
//! timers. Rather than letting them live as implicit control flow, each one is
//! an explicit, cancellable task whose lifecycle is observable:
//!
//! ```text
//!   Idle ──schedule──▶ Pending ──elapsed──▶ Fired
//!                         │
//!                         └──cancel / reschedule / drop──▶ Cancelled
//! ```
//!
//! - [`Timer`] is a one-shot slot. Scheduling while `Pending` cancels the
//!   previous task first, so a slot never has more than one pending callback.
//! - [`Ticker`] repeats until stopped; it stays `Pending` while running.
//!
//! Cancellation is synchronous: the callback runs while holding the task's
//! state lock, and `cancel` takes the same lock. Once `cancel` returns, no
//! callback is executing and none will run afterwards.
//!
//! Both types spawn onto the current Tokio runtime and must be used from
//! within one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Pending,
    Fired,
    Cancelled,
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct TaskHandle {
    state: Arc<Mutex<TimerState>>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    fn state(&self) -> TimerState {
        *lock(&self.state)
    }

    fn cancel(&self) -> bool {
        let mut state = lock(&self.state);
        if *state != TimerState::Pending {
            return false;
        }
        *state = TimerState::Cancelled;
        self.join.abort();
        true
    }
}

/// A one-shot, reschedulable timer slot.
pub struct Timer {
    label: &'static str,
    current: Option<TaskHandle>,
}

impl Timer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            current: None,
        }
    }

    /// Schedules `callback` to run once after `delay`, cancelling whatever
    /// was pending in this slot.
    pub fn schedule<F>(&mut self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let state = Arc::new(Mutex::new(TimerState::Pending));
        let task_state = Arc::clone(&state);
        let label = self.label;
        let join = tokio::spawn(async move {
            time::sleep(delay).await;
            let mut guard = lock(&task_state);
            if *guard != TimerState::Pending {
                return;
            }
            *guard = TimerState::Fired;
            tracing::debug!(timer = label, "timer fired");
            callback();
        });

        tracing::debug!(timer = label, ?delay, "timer scheduled");
        self.current = Some(TaskHandle { state, join });
    }

    /// Cancels the pending callback, if any. Returns whether something was cancelled.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self
            .current
            .as_ref()
            .map(TaskHandle::cancel)
            .unwrap_or(false);
        if cancelled {
            tracing::debug!(timer = self.label, "timer cancelled");
        }
        cancelled
    }

    pub fn state(&self) -> TimerState {
        self.current
            .as_ref()
            .map(TaskHandle::state)
            .unwrap_or(TimerState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TimerState::Pending
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A repeating task that runs `callback` every `period` until stopped.
///
/// The first run happens one full period after [`Ticker::start`].
pub struct Ticker {
    label: &'static str,
    handle: TaskHandle,
}

impl Ticker {
    pub fn start<F>(label: &'static str, period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let state = Arc::new(Mutex::new(TimerState::Pending));
        let task_state = Arc::clone(&state);
        let join = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let guard = lock(&task_state);
                if *guard != TimerState::Pending {
                    break;
                }
                callback();
            }
        });

        tracing::debug!(ticker = label, ?period, "ticker started");
        Self {
            label,
            handle: TaskHandle { state, join },
        }
    }

    /// Stops the ticker. After this returns no further tick can run.
    pub fn stop(&self) -> bool {
        let stopped = self.handle.cancel();
        if stopped {
            tracing::debug!(ticker = self.label, "ticker stopped");
        }
        stopped
    }

    pub fn state(&self) -> TimerState {
        self.handle.state()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn wait_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let reader = Arc::clone(&count);
        (count, move || reader.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn new_timer_is_idle() {
        let timer = Timer::new("test");
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (count, fired) = counter();
        let mut timer = Timer::new("test");
        timer.schedule(Duration::from_millis(300), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(timer.state(), TimerState::Pending);

        wait_ms(299).await;
        assert_eq!(fired(), 0);

        wait_ms(2).await;
        assert_eq!(fired(), 1);
        assert_eq!(timer.state(), TimerState::Fired);

        wait_ms(1000).await;
        assert_eq!(fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_callback() {
        let (count, fired) = counter();
        let mut timer = Timer::new("test");
        timer.schedule(Duration::from_millis(100), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        assert!(timer.cancel());
        assert_eq!(timer.state(), TimerState::Cancelled);

        wait_ms(500).await;
        assert_eq!(fired(), 0);
        // Nothing left to cancel.
        assert!(!timer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_supersedes_pending_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut timer = Timer::new("test");

        for value in ["a", "ab", "abc"] {
            let seen = Arc::clone(&seen);
            timer.schedule(Duration::from_millis(300), move || {
                seen.lock().unwrap().push(value);
            });
            wait_ms(100).await;
        }

        wait_ms(250).await;
        assert_eq!(*seen.lock().unwrap(), vec!["abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timer_cancels_it() {
        let (count, fired) = counter();
        {
            let mut timer = Timer::new("test");
            timer.schedule(Duration::from_millis(50), move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        wait_ms(100).await;
        assert_eq!(fired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_runs_every_period_until_stopped() {
        let (count, ticks) = counter();
        let ticker = Ticker::start("test", Duration::from_millis(200), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        wait_ms(199).await;
        assert_eq!(ticks(), 0);

        wait_ms(502).await;
        assert_eq!(ticks(), 3);

        assert!(ticker.stop());
        assert_eq!(ticker.state(), TimerState::Cancelled);

        wait_ms(1000).await;
        assert_eq!(ticks(), 3);
    }
}
