//! Messages exchanged between clients and the timer authority
//!
//! Both directions are closed enums tagged on `type`, so the JSON form matches
//! what browser and native clients send (`{"type":"START_TIMER"}`).

use serde::{Deserialize, Serialize};

use crate::state::{TaskContext, TimerMode, TimerSnapshot};

/// Client → authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    StartTimer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task: Option<TaskContext>,
    },
    PauseTimer,
    ResumeTimer,
    StopTimer,
    SkipBreak,
    SkipCycle,
    SetFocusDuration {
        minutes: u32,
    },
    SetCycleCount {
        count: u32,
    },
    SyncState,
}

impl Command {
    pub fn start() -> Self {
        Self::StartTimer { task: None }
    }

    /// Wire name, used for logging and last-action tracking
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartTimer { .. } => "START_TIMER",
            Self::PauseTimer => "PAUSE_TIMER",
            Self::ResumeTimer => "RESUME_TIMER",
            Self::StopTimer => "STOP_TIMER",
            Self::SkipBreak => "SKIP_BREAK",
            Self::SkipCycle => "SKIP_CYCLE",
            Self::SetFocusDuration { .. } => "SET_FOCUS_DURATION",
            Self::SetCycleCount { .. } => "SET_CYCLE_COUNT",
            Self::SyncState => "SYNC_STATE",
        }
    }
}

/// Authority → every connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Broadcast {
    TimerState(TimerSnapshot),
    /// Sent once per phase boundary, before the `TIMER_STATE` describing the new phase
    #[serde(rename_all = "camelCase")]
    CycleEnd {
        next_mode: TimerMode,
        completed_focus_count_in_cycle: u32,
    },
}

impl Broadcast {
    pub fn snapshot(&self) -> Option<&TimerSnapshot> {
        match self {
            Self::TimerState(snapshot) => Some(snapshot),
            Self::CycleEnd { .. } => None,
        }
    }
}
