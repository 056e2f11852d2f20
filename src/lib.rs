//! Focus Timer - A background-durable Pomodoro timer authority
//!
//! One authority task owns the timer state and the focus/break cycle. Clients
//! talk to it over the bridge: commands go in, state broadcasts come out, and a
//! presentation adapter smooths the countdown for display.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod presentation;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use bridge::{Broadcast, Command, TimerBridge, TimerClient};
pub use config::Config;
pub use error::{Result, TimerError};
pub use state::{AppState, TimerMode, TimerSnapshot, TimerStatus};
pub use tasks::TimerAuthority;
pub use utils::signals::shutdown_signal;
