use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notifications::NotificationError;

/// Default lifetime for the basic kinds.
pub const DEFAULT_DURATION_MS: u64 = 5_000;
pub const CELEBRATION_DURATION_MS: u64 = 8_000;
pub const GIFT_DURATION_MS: u64 = 8_000;
pub const ACHIEVEMENT_DURATION_MS: u64 = 10_000;

/// Identifier assigned by the store. Monotonic per center, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
    Celebration,
    Achievement,
    Gift,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 8] = [
        NotificationKind::Success,
        NotificationKind::Error,
        NotificationKind::Warning,
        NotificationKind::Info,
        NotificationKind::Celebration,
        NotificationKind::Achievement,
        NotificationKind::Gift,
        NotificationKind::System,
    ];

    /// Lifetime applied when a non-persistent spec leaves `duration_ms` unset.
    pub fn default_duration_ms(self) -> u64 {
        match self {
            NotificationKind::Celebration => CELEBRATION_DURATION_MS,
            NotificationKind::Gift => GIFT_DURATION_MS,
            NotificationKind::Achievement => ACHIEVEMENT_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
            NotificationKind::Celebration => "celebration",
            NotificationKind::Achievement => "achievement",
            NotificationKind::Gift => "gift",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NotificationError::InvalidSpec(format!("unknown kind '{s}'")))
    }
}

pub type ActionCallback = Arc<dyn Fn() + Send + Sync>;

/// A labelled button on a notification. Clicking it runs the callback and
/// leaves the notification in place.
#[derive(Clone)]
pub struct NotificationAction {
    pub label: String,
    pub callback: ActionCallback,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// What a caller asks for. Defaults are merged in by the store.
#[derive(Debug, Clone)]
pub struct NotificationSpec {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub duration_ms: Option<u64>,
    pub persistent: bool,
    pub action: Option<NotificationAction>,
}

impl NotificationSpec {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms: None,
            persistent: false,
            action: None,
        }
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    #[must_use]
    pub fn action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Untyped JSON body accepted by `POST /api/v1/notifications`.
/// `kind` is kept raw so a missing or non-string kind still surfaces as
/// `InvalidSpec` rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    #[serde(default)]
    pub kind: Option<Value>,
    pub title: String,
    pub message: String,
    pub duration_ms: Option<i64>,
    pub persistent: Option<bool>,
    pub action_label: Option<String>,
}

impl TryFrom<NotificationRequest> for NotificationSpec {
    type Error = NotificationError;

    /// Converts everything except `action_label`; the caller decides what a
    /// click on a REST-created action does.
    fn try_from(req: NotificationRequest) -> Result<Self, Self::Error> {
        let kind: NotificationKind = match req.kind {
            Some(Value::String(name)) => name.parse()?,
            None | Some(Value::Null) => {
                return Err(NotificationError::InvalidSpec("kind is required".to_string()))
            }
            Some(other) => {
                return Err(NotificationError::InvalidSpec(format!(
                    "kind must be a string, got {other}"
                )))
            }
        };
        let duration_ms = match req.duration_ms {
            Some(ms) if ms <= 0 => {
                return Err(NotificationError::InvalidSpec(format!(
                    "duration_ms must be positive, got {ms}"
                )))
            }
            Some(ms) => Some(ms.unsigned_abs()),
            None => None,
        };
        let mut spec = NotificationSpec::new(kind, req.title, req.message);
        if let Some(ms) = duration_ms {
            spec = spec.duration_ms(ms);
        }
        if req.persistent.unwrap_or(false) {
            spec = spec.persistent();
        }
        Ok(spec)
    }
}

/// An active notification, owned by the store.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// `Some(d > 0)` exactly when the notification is not persistent.
    pub duration_ms: Option<u64>,
    pub persistent: bool,
    #[serde(skip)]
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    pub fn action_label(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.label.as_str())
    }
}

/// Point-in-time copy of the active sequence, in insertion order.
pub type Snapshot = Arc<Vec<Notification>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str, duration_ms: Option<i64>) -> NotificationRequest {
        NotificationRequest {
            kind: Some(Value::String(kind.to_string())),
            title: "t".to_string(),
            message: "m".to_string(),
            duration_ms,
            persistent: None,
            action_label: None,
        }
    }

    #[test]
    fn test_kind_parses_every_known_name() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_invalid_spec() {
        let err = "bogus".parse::<NotificationKind>().unwrap_err();
        assert!(matches!(err, NotificationError::InvalidSpec(_)));
    }

    #[test]
    fn test_default_durations_per_kind() {
        assert_eq!(NotificationKind::Success.default_duration_ms(), 5_000);
        assert_eq!(NotificationKind::System.default_duration_ms(), 5_000);
        assert_eq!(NotificationKind::Celebration.default_duration_ms(), 8_000);
        assert_eq!(NotificationKind::Gift.default_duration_ms(), 8_000);
        assert_eq!(NotificationKind::Achievement.default_duration_ms(), 10_000);
    }

    #[test]
    fn test_request_with_non_positive_duration_rejected() {
        for ms in [0, -250] {
            let err = NotificationSpec::try_from(request("info", Some(ms))).unwrap_err();
            assert!(matches!(err, NotificationError::InvalidSpec(_)));
        }
    }

    #[test]
    fn test_request_without_kind_rejected() {
        let mut req = request("info", None);
        req.kind = None;
        let err = NotificationSpec::try_from(req).unwrap_err();
        assert_eq!(err, NotificationError::InvalidSpec("kind is required".to_string()));
    }

    #[test]
    fn test_request_with_non_string_kind_rejected() {
        let mut req = request("info", None);
        req.kind = Some(serde_json::json!(7));
        let err = NotificationSpec::try_from(req).unwrap_err();
        assert!(matches!(err, NotificationError::InvalidSpec(msg) if msg.contains("string")));
    }

    #[test]
    fn test_request_deserializes_without_kind_field() {
        let req: NotificationRequest =
            serde_json::from_str(r#"{"title": "t", "message": "m"}"#).unwrap();
        assert!(req.kind.is_none());
    }

    #[test]
    fn test_request_converts_to_typed_spec() {
        let spec = NotificationSpec::try_from(request("gift", Some(1_200))).unwrap();
        assert_eq!(spec.kind, NotificationKind::Gift);
        assert_eq!(spec.duration_ms, Some(1_200));
        assert!(!spec.persistent);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationKind::Achievement).unwrap();
        assert_eq!(json, "\"achievement\"");
    }
}
