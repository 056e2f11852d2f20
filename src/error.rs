//! Error types for the timer infrastructure
//!
//! Timer commands themselves never fail: invalid transitions are ignored and the
//! current state is rebroadcast. These errors only cover the plumbing around the
//! authority (bridge locking, persistence, notification delivery).

/// Infrastructure error for the focus timer.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// The bridge's shared queue could not be locked.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// Snapshot persistence failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The platform refused to show notifications.
    #[error("notification permission denied: {0}")]
    PermissionDenied(String),

    /// Notification delivery failed for any other reason.
    #[error("notification error: {0}")]
    Notification(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TimerError>;
