//! State management module
//!
//! The timekeeping primitive, the cycle rules, the timer state machine built on
//! them, and the HTTP-facing application state.

pub mod app_state;
pub mod countdown;
pub mod cycle;
pub mod persisted;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use countdown::{Clock, ManualClock, SystemClock};
pub use cycle::{CyclePolicy, PhaseChange, TimerMode, TransitionKind};
pub use persisted::{PersistedTimer, SnapshotStore};
pub use timer_state::{TaskContext, Tick, TimerSettings, TimerSnapshot, TimerState, TimerStatus};
