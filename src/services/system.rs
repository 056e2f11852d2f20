//! Desktop notification delivery through `notify-send`

use std::io::ErrorKind;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, TimerError};

/// Show a desktop notification right now
pub async fn execute_desktop_notification(title: &str, body: &str) -> Result<()> {
    debug!("Showing desktop notification: {}", title);

    let output = Command::new("notify-send")
        .args(["--app-name=focus-timer", title, body])
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                TimerError::PermissionDenied(format!("notify-send not permitted: {}", e))
            }
            _ => TimerError::Notification(format!("Failed to execute notify-send: {}", e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TimerError::Notification(format!("notify-send failed: {}", stderr)));
    }

    Ok(())
}

/// Check if notify-send is available on the system
pub async fn check_notify_send_available() -> Result<()> {
    Command::new("notify-send")
        .arg("--version")
        .output()
        .await
        .map_err(|_| {
            TimerError::Notification(
                "notify-send is not available, desktop notifications disabled".to_string(),
            )
        })?;

    info!("notify-send is available");
    Ok(())
}
