//! Schedule/cancel capability behind the notification timers.
//!
//! `TokioScheduler` backs production: each timer is a spawned task that
//! sleeps, then runs its callback, and cancelling aborts the task.
//! `ManualScheduler` is a simulated clock; nothing fires until `advance`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;

pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Monotonic time since the scheduler was created.
    fn now(&self) -> Duration;

    /// Runs `task` once `delay` has elapsed, unless the handle is cancelled first.
    fn after(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

/// Cancels a pending timer. Dropping the handle leaves the timer running.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tokio runtime
// ────────────────────────────────────────────────────────────────────────────

pub struct TokioScheduler {
    handle: Handle,
    epoch: Instant,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            epoch: Instant::now(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.epoch)
    }

    fn after(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated clock
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    /// Keyed by (deadline, sequence) so equal deadlines fire in FIFO order.
    pending: BTreeMap<(Duration, u64), ScheduledTask>,
}

/// Deterministic scheduler. Cloning shares the same clock and queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward, firing every timer due on the way.
    /// Tasks run with no lock held, so they may schedule or cancel timers;
    /// a timer scheduled inside the window fires too if its deadline is reached.
    pub fn advance(&self, delta: Duration) {
        let target = self.lock().now + delta;
        loop {
            let task = {
                let mut state = self.lock();
                let due = state
                    .pending
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.pending.remove(&key)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn after(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let key = {
            let mut state = self.lock();
            let key = (state.now + delay, state.next_seq);
            state.next_seq += 1;
            state.pending.insert(key, task);
            key
        };
        let state = Arc::clone(&self.state);
        TimerHandle::new(move || {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pending
                .remove(&key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> ScheduledTask) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |name: &'static str| -> ScheduledTask {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_manual_fires_only_when_due() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        let _h = scheduler.after(Duration::from_millis(100), task("a"));
        scheduler.advance_ms(99);
        assert!(log.lock().unwrap().is_empty());
        scheduler.advance_ms(1);
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_manual_fires_in_deadline_then_fifo_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        let _a = scheduler.after(Duration::from_millis(30), task("late"));
        let _b = scheduler.after(Duration::from_millis(10), task("first"));
        let _c = scheduler.after(Duration::from_millis(10), task("second"));
        scheduler.advance_ms(50);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_manual_cancel_prevents_firing() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();
        let handle = scheduler.after(Duration::from_millis(10), task("a"));
        handle.cancel();
        assert_eq!(scheduler.pending(), 0);
        scheduler.advance_ms(1_000);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_manual_task_can_reschedule_within_window() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let inner_scheduler = scheduler.clone();
        let counter = Arc::clone(&fired);
        let _h = scheduler.after(
            Duration::from_millis(10),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let counter = Arc::clone(&counter);
                let _ = inner_scheduler.after(
                    Duration::from_millis(10),
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );
        scheduler.advance_ms(25);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_after_delay() {
        let scheduler = TokioScheduler::new(Handle::current());
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let _h = scheduler.after(
            Duration::from_millis(500),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scheduler.now() >= Duration::from_millis(501));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_aborts_task() {
        let scheduler = TokioScheduler::new(Handle::current());
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let handle = scheduler.after(
            Duration::from_millis(100),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
