//! Per-notification expiry timers with hover-pause.
//!
//! Each non-persistent notification moves through
//! `Scheduled -> Paused -> Scheduled ...` until it expires or is dismissed.
//! Both terminal transitions drop the entry, so `phase()` reports `None`.
//! Every (re)schedule gets a fresh `TimerToken`; a firing whose token no
//! longer matches is stale and ignored.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::notifications::models::NotificationId;
use crate::notifications::scheduler::{ScheduledTask, Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scheduled,
    Paused,
}

#[derive(Debug)]
enum TimerState {
    Scheduled {
        token: TimerToken,
        started_at: Duration,
        remaining: Duration,
        handle: TimerHandle,
    },
    Paused {
        remaining: Duration,
    },
}

#[derive(Debug)]
struct TimerEntry {
    duration: Duration,
    state: TimerState,
}

impl TimerEntry {
    fn remaining(&self, now: Duration) -> Duration {
        match &self.state {
            TimerState::Scheduled {
                started_at,
                remaining,
                ..
            } => remaining.saturating_sub(now.saturating_sub(*started_at)),
            TimerState::Paused { remaining } => *remaining,
        }
    }
}

#[derive(Debug, Default)]
pub struct LifecycleManager {
    timers: HashMap<NotificationId, TimerEntry>,
    next_token: u64,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the expiry timer for `id`, replacing any existing one.
    /// `make_task` builds the callback for the token assigned to this run.
    pub fn schedule<F>(
        &mut self,
        id: NotificationId,
        duration: Duration,
        scheduler: &dyn Scheduler,
        make_task: F,
    ) where
        F: FnOnce(TimerToken) -> ScheduledTask,
    {
        self.dismiss(id);
        let state = self.start(duration, scheduler, make_task);
        self.timers.insert(id, TimerEntry { duration, state });
    }

    /// Freezes the remaining time. Returns false for ids without a timer.
    pub fn pause(&mut self, id: NotificationId, now: Duration) -> bool {
        let Some(entry) = self.timers.get_mut(&id) else {
            return false;
        };
        let remaining = entry.remaining(now);
        let previous = std::mem::replace(&mut entry.state, TimerState::Paused { remaining });
        if let TimerState::Scheduled { handle, .. } = previous {
            handle.cancel();
        }
        true
    }

    /// Restarts a paused timer with the time it had left.
    /// Returns false for ids without a timer.
    pub fn resume<F>(&mut self, id: NotificationId, scheduler: &dyn Scheduler, make_task: F) -> bool
    where
        F: FnOnce(TimerToken) -> ScheduledTask,
    {
        let remaining = match self.timers.get(&id) {
            None => return false,
            Some(TimerEntry {
                state: TimerState::Scheduled { .. },
                ..
            }) => return true,
            Some(TimerEntry {
                state: TimerState::Paused { remaining },
                ..
            }) => *remaining,
        };
        let state = self.start(remaining, scheduler, make_task);
        if let Some(entry) = self.timers.get_mut(&id) {
            entry.state = state;
        }
        true
    }

    /// Cancels and forgets the timer for `id`.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match self.timers.remove(&id) {
            Some(entry) => {
                if let TimerState::Scheduled { handle, .. } = entry.state {
                    handle.cancel();
                }
                true
            }
            None => false,
        }
    }

    pub fn dismiss_all(&mut self) -> usize {
        let count = self.timers.len();
        for (_, entry) in self.timers.drain() {
            if let TimerState::Scheduled { handle, .. } = entry.state {
                handle.cancel();
            }
        }
        count
    }

    /// Accepts a timer firing. Only the current run of a scheduled timer
    /// counts; anything else is stale and returns false.
    pub fn expire(&mut self, id: NotificationId, token: TimerToken) -> bool {
        let current = matches!(
            self.timers.get(&id),
            Some(TimerEntry { state: TimerState::Scheduled { token: t, .. }, .. }) if *t == token
        );
        if current {
            self.timers.remove(&id);
        }
        current
    }

    pub fn phase(&self, id: NotificationId) -> Option<Phase> {
        self.timers.get(&id).map(|entry| match entry.state {
            TimerState::Scheduled { .. } => Phase::Scheduled,
            TimerState::Paused { .. } => Phase::Paused,
        })
    }

    pub fn remaining(&self, id: NotificationId, now: Duration) -> Option<Duration> {
        self.timers.get(&id).map(|entry| entry.remaining(now))
    }

    /// `remaining / duration`, clamped to [0, 1].
    pub fn progress(&self, id: NotificationId, now: Duration) -> Option<f64> {
        let entry = self.timers.get(&id)?;
        if entry.duration.is_zero() {
            return Some(0.0);
        }
        let fraction = entry.remaining(now).as_secs_f64() / entry.duration.as_secs_f64();
        Some(fraction.clamp(0.0, 1.0))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn start<F>(&mut self, remaining: Duration, scheduler: &dyn Scheduler, make_task: F) -> TimerState
    where
        F: FnOnce(TimerToken) -> ScheduledTask,
    {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let handle = scheduler.after(remaining, make_task(token));
        TimerState::Scheduled {
            token,
            started_at: scheduler.now(),
            remaining,
            handle,
        }
    }
}
