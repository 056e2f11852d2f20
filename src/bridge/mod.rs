//! Client sync bridge
//!
//! Message protocol and transport between foreground clients and the
//! background timer authority.

pub mod client;
pub mod protocol;

// Re-export main types
pub use client::{AuthorityEndpoint, Delivery, Request, TimerBridge, TimerClient};
pub use protocol::{Broadcast, Command};
