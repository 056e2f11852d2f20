//! External service integration module
//!
//! Notification content, delivery sinks, and the desktop notifier they can
//! hand off to.

pub mod notifications;
pub mod system;

// Re-export main types
pub use notifications::*;
pub use system::*;
