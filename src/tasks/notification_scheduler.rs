//! Notification scheduler background task

use std::{collections::HashMap, time::Duration};

use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    error::TimerError,
    services::{Notification, NotificationId, NotificationRequest, NotificationSink},
    state::Clock,
};

/// Longest the scheduler sleeps before looking at the wall clock again. A host
/// suspension can stall the sleep itself, so deadlines are rechecked against
/// the clock rather than trusted to the timer.
const MAX_SLEEP: Duration = Duration::from_secs(1);

/// Background task that fires scheduled notifications at their wall-clock time.
///
/// Scheduling, cancellation and delivery all happen on this one task in request
/// order, so a `Cancel` processed before the deadline always wins.
pub async fn notification_scheduler_task<C, S>(
    mut requests: mpsc::UnboundedReceiver<NotificationRequest>,
    clock: C,
    sink: S,
) where
    C: Clock,
    S: NotificationSink,
{
    info!("Starting notification scheduler task");

    let mut pending: HashMap<NotificationId, Notification> = HashMap::new();

    loop {
        let wait = next_wait(&pending, clock.now_ms());

        tokio::select! {
            request = requests.recv() => {
                match request {
                    Some(NotificationRequest::Schedule(notification)) => {
                        debug!(
                            "Scheduling notification {:?} at {}",
                            notification.id, notification.fire_at_ms
                        );
                        pending.insert(notification.id, notification);
                    }
                    Some(NotificationRequest::Cancel { id }) => {
                        if pending.remove(&id).is_some() {
                            debug!("Cancelled notification {:?}", id);
                        }
                    }
                    None => {
                        info!("Notification channel closed, stopping scheduler");
                        break;
                    }
                }
            }

            _ = sleep(wait.unwrap_or(MAX_SLEEP)), if wait.is_some() => {
                let now = clock.now_ms();
                let mut due: Vec<NotificationId> = pending
                    .values()
                    .filter(|n| n.fire_at_ms <= now)
                    .map(|n| n.id)
                    .collect();
                due.sort();

                for id in due {
                    if let Some(notification) = pending.remove(&id) {
                        deliver(&sink, &notification).await;
                    }
                }
            }
        }
    }
}

fn next_wait(pending: &HashMap<NotificationId, Notification>, now_ms: i64) -> Option<Duration> {
    let earliest = pending.values().map(|n| n.fire_at_ms).min()?;
    let ms = u64::try_from(earliest.saturating_sub(now_ms)).unwrap_or(0);
    Some(Duration::from_millis(ms).min(MAX_SLEEP))
}

async fn deliver<S: NotificationSink>(sink: &S, notification: &Notification) {
    match sink.deliver(notification).await {
        Ok(()) => debug!("Delivered notification {:?}", notification.id),
        Err(TimerError::PermissionDenied(reason)) => {
            debug!("Skipping notification, permission denied: {}", reason);
        }
        Err(e) => warn!("Failed to deliver notification {:?}: {}", notification.id, e),
    }
}
