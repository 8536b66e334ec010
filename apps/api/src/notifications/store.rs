use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::notifications::models::{Notification, NotificationId, NotificationSpec, Snapshot};
use crate::notifications::NotificationError;

/// Ordered set of active notifications.
///
/// The sequence sits behind an `Arc` so `list()` is a cheap snapshot; the
/// next mutation clones it if a reader still holds the old one.
#[derive(Debug)]
pub struct NotificationStore {
    entries: Snapshot,
    next_id: u64,
    max_active: Option<usize>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            next_id: 1,
            max_active: None,
        }
    }

    /// Caps the number of active notifications. Older entries are evicted
    /// first when an add would exceed the cap.
    #[must_use]
    pub fn max_active(mut self, max: Option<usize>) -> Self {
        self.max_active = max.filter(|m| *m > 0);
        self
    }

    /// Validates `spec`, merges defaults, and appends the record.
    /// Returns the stored notification plus any entries evicted to make room.
    pub fn add(
        &mut self,
        spec: NotificationSpec,
        created_at: DateTime<Utc>,
    ) -> Result<(Notification, Vec<Notification>), NotificationError> {
        let duration_ms = Self::resolve_duration(&spec)?;
        Ok(self.insert(spec, duration_ms, created_at))
    }

    /// Effective lifetime for `spec`: `None` when persistent, otherwise the
    /// explicit duration or the kind default.
    fn resolve_duration(spec: &NotificationSpec) -> Result<Option<u64>, NotificationError> {
        if spec.persistent {
            return Ok(None);
        }
        match spec.duration_ms {
            Some(0) => Err(NotificationError::InvalidSpec(
                "duration_ms must be positive".to_string(),
            )),
            Some(ms) => Ok(Some(ms)),
            None => Ok(Some(spec.kind.default_duration_ms())),
        }
    }

    /// Appends an already-resolved record under the next id.
    pub fn insert(
        &mut self,
        spec: NotificationSpec,
        duration_ms: Option<u64>,
        created_at: DateTime<Utc>,
    ) -> (Notification, Vec<Notification>) {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let notification = Notification {
            id,
            kind: spec.kind,
            title: spec.title,
            message: spec.message,
            duration_ms,
            persistent: spec.persistent,
            action: spec.action,
            created_at,
        };

        let entries = Arc::make_mut(&mut self.entries);
        let mut evicted = Vec::new();
        if let Some(max) = self.max_active {
            let overflow = (entries.len() + 1).saturating_sub(max);
            evicted.extend(entries.drain(..overflow));
        }
        entries.push(notification.clone());

        (notification, evicted)
    }

    /// Removes the entry with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let pos = self.entries.iter().position(|n| n.id == id)?;
        Some(Arc::make_mut(&mut self.entries).remove(pos))
    }

    /// Empties the store, returning the ids that were active.
    pub fn clear(&mut self) -> Vec<NotificationId> {
        let ids = self.entries.iter().map(|n| n.id).collect();
        self.entries = Arc::new(Vec::new());
        ids
    }

    pub fn list(&self) -> Snapshot {
        Arc::clone(&self.entries)
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
