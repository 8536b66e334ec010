//! NotificationCenter: the session-scoped entry point for notifications.
//!
//! Owns the store and the lifecycle manager behind a single mutex, so every
//! mutation (caller, timer, hover) is serialized. Each mutation republishes
//! the current snapshot on a `watch` channel for the presentation layer.
//!
//! Constructed once per session and carried in `AppState`; `shutdown()`
//! clears everything and cancels outstanding timers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notifications::lifecycle::{LifecycleManager, Phase, TimerToken};
use crate::notifications::models::{
    Notification, NotificationAction, NotificationId, NotificationKind, NotificationSpec, Snapshot,
};
use crate::notifications::presenter::{present, NotificationView};
use crate::notifications::scheduler::{ScheduledTask, Scheduler};
use crate::notifications::store::NotificationStore;
use crate::notifications::NotificationError;

const ACTION_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct CenterOptions {
    /// Oldest notifications are evicted beyond this many. `None` = unlimited.
    pub max_active: Option<usize>,
}

/// Broadcast whenever a notification's action button is clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInvoked {
    pub id: NotificationId,
    pub label: String,
}

struct CenterState {
    store: NotificationStore,
    lifecycle: LifecycleManager,
}

struct Inner {
    session_id: Uuid,
    state: Mutex<CenterState>,
    scheduler: Arc<dyn Scheduler>,
    snapshots: watch::Sender<Snapshot>,
    actions: broadcast::Sender<ActionInvoked>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CenterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &CenterState) {
        self.snapshots.send_replace(state.store.list());
    }

    /// Timer callback target. Stale or late firings fall through silently.
    fn expire(&self, id: NotificationId, token: TimerToken) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.lifecycle.expire(id, token) {
            debug!("Ignoring stale expiry for notification {id}");
            return;
        }
        if state.store.remove(id).is_some() {
            self.publish(state);
            debug!(session_id = %self.session_id, "Notification {id} expired");
        }
    }
}

fn expiry_task(inner: Weak<Inner>, id: NotificationId, token: TimerToken) -> ScheduledTask {
    Box::new(move || {
        if let Some(inner) = inner.upgrade() {
            inner.expire(id, token);
        }
    })
}

/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new(scheduler: Arc<dyn Scheduler>, options: CenterOptions) -> Self {
        let store = NotificationStore::new().max_active(options.max_active);
        let (snapshots, _) = watch::channel(store.list());
        let (actions, _) = broadcast::channel(ACTION_CHANNEL_CAPACITY);
        let session_id = Uuid::new_v4();
        info!("Notification session {session_id} started");
        Self {
            inner: Arc::new(Inner {
                session_id,
                state: Mutex::new(CenterState {
                    store,
                    lifecycle: LifecycleManager::new(),
                }),
                scheduler,
                snapshots,
                actions,
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Adds a notification and starts its expiry timer unless persistent.
    /// Fails with `InvalidSpec` for a zero duration; nothing is stored then.
    pub fn add_notification(
        &self,
        spec: NotificationSpec,
    ) -> Result<NotificationId, NotificationError> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let (notification, evicted) = state.store.add(spec, Utc::now()).map_err(|e| {
            warn!(session_id = %self.inner.session_id, "Rejected notification: {e}");
            e
        })?;
        Ok(self.track(state, notification, evicted))
    }

    /// Removes a notification and cancels its timer. Unknown ids are a no-op.
    pub fn remove_notification(&self, id: NotificationId) -> bool {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        state.lifecycle.dismiss(id);
        let removed = state.store.remove(id).is_some();
        if removed {
            self.inner.publish(state);
            debug!("Notification {id} dismissed");
        }
        removed
    }

    pub fn clear_all_notifications(&self) {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let cancelled = state.lifecycle.dismiss_all();
        let removed = state.store.clear();
        self.inner.publish(state);
        info!(
            "Cleared {} notifications ({} timers cancelled)",
            removed.len(),
            cancelled
        );
    }

    pub fn list(&self) -> Snapshot {
        self.inner.lock().store.list()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.inner.lock().store.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    /// Pauses auto-dismissal while the pointer is over the notification.
    /// Returns false if the notification is not active.
    pub fn hover_start(&self, id: NotificationId) -> bool {
        let mut state = self.inner.lock();
        if !state.store.contains(id) {
            return false;
        }
        state.lifecycle.pause(id, self.inner.scheduler.now());
        true
    }

    /// Resumes auto-dismissal with whatever time was left at `hover_start`.
    pub fn hover_end(&self, id: NotificationId) -> bool {
        let mut state = self.inner.lock();
        if !state.store.contains(id) {
            return false;
        }
        let weak = Arc::downgrade(&self.inner);
        state
            .lifecycle
            .resume(id, self.inner.scheduler.as_ref(), |token| {
                expiry_task(weak, id, token)
            });
        true
    }

    /// Runs the action callback. The notification stays in place.
    /// Returns false when there is no such notification or it has no action.
    pub fn invoke_action(&self, id: NotificationId) -> bool {
        let action = self.inner.lock().store.get(id).and_then(|n| n.action.clone());
        let Some(action) = action else {
            return false;
        };
        // Lock released: the callback may call back into the center.
        (action.callback)();
        let _ = self.inner.actions.send(ActionInvoked {
            id,
            label: action.label,
        });
        true
    }

    pub fn progress(&self, id: NotificationId) -> Option<f64> {
        self.inner
            .lock()
            .lifecycle
            .progress(id, self.inner.scheduler.now())
    }

    pub fn phase(&self, id: NotificationId) -> Option<Phase> {
        self.inner.lock().lifecycle.phase(id)
    }

    /// Renderable projection of the current snapshot.
    pub fn views(&self) -> Vec<NotificationView> {
        let state = self.inner.lock();
        let now = self.inner.scheduler.now();
        present(&state.store.list(), |id| state.lifecycle.progress(id, now))
    }

    /// Receives a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn actions(&self) -> broadcast::Receiver<ActionInvoked> {
        self.inner.actions.subscribe()
    }

    /// Ends the session: clears all notifications and cancels every timer.
    pub fn shutdown(&self) {
        self.clear_all_notifications();
        info!("Notification session {} ended", self.inner.session_id);
    }

    pub fn notify_success(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Success, title, message, action)
    }

    pub fn notify_error(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Error, title, message, action)
    }

    pub fn notify_warning(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Warning, title, message, action)
    }

    pub fn notify_info(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Info, title, message, action)
    }

    pub fn notify_celebration(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Celebration, title, message, action)
    }

    pub fn notify_achievement(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Achievement, title, message, action)
    }

    pub fn notify_gift(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::Gift, title, message, action)
    }

    pub fn notify_system(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        self.notify(NotificationKind::System, title, message, action)
    }

    fn notify(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NotificationId {
        let mut spec = NotificationSpec::new(kind, title, message);
        spec.action = action;
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let duration_ms = Some(kind.default_duration_ms());
        let (notification, evicted) = state.store.insert(spec, duration_ms, Utc::now());
        self.track(state, notification, evicted)
    }

    /// Starts the timer for a freshly stored notification and cancels the
    /// timers of anything evicted to make room for it.
    fn track(
        &self,
        state: &mut CenterState,
        notification: Notification,
        evicted: Vec<Notification>,
    ) -> NotificationId {
        for old in &evicted {
            state.lifecycle.dismiss(old.id);
            debug!("Evicted notification {} to stay within capacity", old.id);
        }

        let id = notification.id;
        if let Some(duration) = notification.duration() {
            let weak = Arc::downgrade(&self.inner);
            state
                .lifecycle
                .schedule(id, duration, self.inner.scheduler.as_ref(), |token| {
                    expiry_task(weak, id, token)
                });
        }
        self.inner.publish(state);

        info!(
            session_id = %self.inner.session_id,
            kind = %notification.kind,
            "Notification {id} added ({})",
            match notification.duration_ms {
                Some(ms) => format!("expires in {ms}ms"),
                None => "persistent".to_string(),
            }
        );
        id
    }
}
