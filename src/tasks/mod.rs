//! Background tasks module
//!
//! The timer authority and the notification scheduler it feeds. Both run
//! alongside the HTTP server and outlive any connected client.

pub mod notification_scheduler;
pub mod timer_authority;

// Re-export main functions
pub use notification_scheduler::notification_scheduler_task;
pub use timer_authority::{timer_authority_task, TimerAuthority};
