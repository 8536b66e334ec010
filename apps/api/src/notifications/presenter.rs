use serde::Serialize;

use crate::notifications::models::{Notification, NotificationId, NotificationKind};

/// Visual defaults for a kind. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub icon: &'static str,
    pub accent: &'static str,
}

pub fn theme_for(kind: NotificationKind) -> Theme {
    let (icon, accent) = match kind {
        NotificationKind::Success => ("check-circle", "green"),
        NotificationKind::Error => ("x-circle", "red"),
        NotificationKind::Warning => ("alert-triangle", "amber"),
        NotificationKind::Info => ("info", "blue"),
        NotificationKind::Celebration => ("party-popper", "pink"),
        NotificationKind::Achievement => ("trophy", "gold"),
        NotificationKind::Gift => ("gift", "purple"),
        NotificationKind::System => ("settings", "slate"),
    };
    Theme { icon, accent }
}

/// One renderable notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub theme: Theme,
    pub persistent: bool,
    /// Remaining lifetime as a fraction; `None` when there is no timer.
    pub progress: Option<f64>,
    pub action_label: Option<String>,
}

/// Projects a snapshot into views, keeping store order.
pub fn present<F>(notifications: &[Notification], progress: F) -> Vec<NotificationView>
where
    F: Fn(NotificationId) -> Option<f64>,
{
    notifications
        .iter()
        .map(|n| NotificationView {
            id: n.id,
            kind: n.kind,
            title: n.title.clone(),
            message: n.message.clone(),
            theme: theme_for(n.kind),
            persistent: n.persistent,
            progress: progress(n.id),
            action_label: n.action_label().map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::models::NotificationAction;
    use chrono::Utc;

    fn notification(id: u64, kind: NotificationKind) -> Notification {
        Notification {
            id: NotificationId(id),
            kind,
            title: format!("title {id}"),
            message: "message".to_string(),
            duration_ms: Some(kind.default_duration_ms()),
            persistent: false,
            action: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_present_keeps_order_and_fields() {
        let mut second = notification(2, NotificationKind::Gift);
        second.action = Some(NotificationAction::new("Open", || {}));
        let items = vec![notification(7, NotificationKind::Error), second];

        let views = present(&items, |id| (id == NotificationId(7)).then_some(0.5));
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, NotificationId(7));
        assert_eq!(views[0].progress, Some(0.5));
        assert_eq!(views[0].theme, theme_for(NotificationKind::Error));
        assert_eq!(views[1].id, NotificationId(2));
        assert_eq!(views[1].progress, None);
        assert_eq!(views[1].action_label.as_deref(), Some("Open"));
    }

    #[test]
    fn test_every_kind_has_distinct_accent() {
        let mut accents: Vec<_> = NotificationKind::ALL
            .into_iter()
            .map(|k| theme_for(k).accent)
            .collect();
        accents.sort_unstable();
        accents.dedup();
        assert_eq!(accents.len(), NotificationKind::ALL.len());
    }
}
