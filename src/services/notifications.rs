//! Notification side channel
//!
//! The authority never shows notifications itself. It sends `Schedule` and
//! `Cancel` requests to the scheduler task, which fires them at their absolute
//! wall-clock time through a `NotificationSink`.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::system::execute_desktop_notification;
use crate::error::Result;
use crate::state::{TaskContext, TransitionKind};

/// Identifies one scheduled notification so it can be cancelled later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

/// A notification due at an absolute time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub fire_at_ms: i64,
}

/// Requests on the notification side channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationRequest {
    Schedule(Notification),
    Cancel { id: NotificationId },
}

/// Title and body announcing the end of a phase
pub fn phase_end_text(kind: TransitionKind, task: Option<&TaskContext>) -> (String, String) {
    let focus_subject = task
        .and_then(|t| t.title.as_deref())
        .map(|title| format!("Focus on \"{}\" complete", title))
        .unwrap_or_else(|| "Focus complete".to_string());

    match kind {
        TransitionKind::FocusComplete => (
            focus_subject,
            "Nice work. Take a short break.".to_string(),
        ),
        TransitionKind::CycleComplete => (
            "Cycle complete".to_string(),
            format!("{}. You earned a long break.", focus_subject),
        ),
        TransitionKind::BreakOver => (
            "Break over".to_string(),
            "Back to focus.".to_string(),
        ),
        TransitionKind::CycleRestarted => (
            "Cycle restarted".to_string(),
            "Long break finished. A new cycle begins.".to_string(),
        ),
        TransitionKind::FocusRepeat => (
            focus_subject,
            "Ready for the next session.".to_string(),
        ),
    }
}

/// Where due notifications end up
pub trait NotificationSink: Send + Sync + 'static {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>>;
}

/// Desktop notifications via notify-send
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(execute_desktop_notification(
            &notification.title,
            &notification.body,
        ))
    }
}

/// Writes notifications to the log; used when no desktop is available
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        info!("Notification: {} - {}", notification.title, notification.body);
        Box::pin(async { Ok(()) })
    }
}

/// Drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn deliver<'a>(&'a self, _notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

impl NotificationSink for Box<dyn NotificationSink> {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        (**self).deliver(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_title_appears_in_focus_text() {
        let task = TaskContext {
            task_id: "7".to_string(),
            subtask_id: Some("7.1".to_string()),
            title: Some("Draft slides".to_string()),
        };
        let (title, _) = phase_end_text(TransitionKind::FocusComplete, Some(&task));
        assert_eq!(title, "Focus on \"Draft slides\" complete");

        let (_, body) = phase_end_text(TransitionKind::CycleComplete, Some(&task));
        assert!(body.contains("Draft slides"));
        assert!(body.contains("long break"));
    }

    #[test]
    fn break_text_ignores_task() {
        let (title, body) = phase_end_text(TransitionKind::BreakOver, None);
        assert_eq!(title, "Break over");
        assert_eq!(body, "Back to focus.");
    }

    #[test]
    fn cancel_request_is_distinct_on_the_wire() {
        let cancel = NotificationRequest::Cancel {
            id: NotificationId(3),
        };
        let value = serde_json::to_value(&cancel).unwrap();
        assert_eq!(value["type"], "CANCEL");
        assert_eq!(value["id"], 3);
    }
}
