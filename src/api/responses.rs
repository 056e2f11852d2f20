//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{bridge::Delivery, state::TimerSnapshot};

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `sent` when the authority took the command, `queued` when it will later
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: Option<TimerSnapshot>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: Option<TimerSnapshot>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn for_delivery(command: &str, delivery: Delivery, timer: Option<TimerSnapshot>) -> Self {
        match delivery {
            Delivery::Sent => {
                Self::new("sent".to_string(), format!("{} delivered", command), timer)
            }
            Delivery::Queued => Self::new(
                "queued".to_string(),
                format!("{} queued until the timer authority is available", command),
                timer,
            ),
        }
    }
}

/// Body of POST /timer/focus-duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusDurationRequest {
    pub minutes: u32,
}

/// Body of POST /timer/cycle-count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleCountRequest {
    pub count: u32,
}

/// Status response with the rendered timer view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: Option<TimerSnapshot>,
    pub authority_attached: bool,
    pub queued_commands: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
