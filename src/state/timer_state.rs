//! Timer state structure and management
//!
//! `TimerState` is owned by the authority task and only leaves it as a
//! `TimerSnapshot`. Every mutation takes the current wall-clock time explicitly,
//! which keeps the state machine deterministic under test.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::countdown::{remaining_seconds, target_end};
use super::cycle::{next_phase, CyclePolicy, PhaseChange, TimerMode};
use super::persisted::PersistedTimer;

/// Whether the countdown is advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Task a focus session is spent on. Only used for notification text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Durations and cycle rules the authority starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    pub focus_seconds: u32,
    pub short_break_seconds: u32,
    pub long_break_seconds: u32,
    pub policy: CyclePolicy,
    /// Land idle in the next phase after expiry instead of running straight on
    pub manual_advance: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_seconds: 25 * 60,
            short_break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
            policy: CyclePolicy::standard(),
            manual_advance: false,
        }
    }
}

/// Immutable copy of the timer state handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub remaining_seconds: u32,
    pub completed_focus_count_in_cycle: u32,
    pub focus_duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_per_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_end_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_task: Option<TaskContext>,
}

impl TimerSnapshot {
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

/// Result of one interval firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running, nothing changed
    Idle,
    /// Still counting; carries the freshly derived remaining time
    Counting(u32),
    /// The phase ran out and the transition table was applied
    Expired(PhaseChange),
}

/// Canonical timer state
#[derive(Debug, Clone)]
pub struct TimerState {
    settings: TimerSettings,
    mode: TimerMode,
    status: TimerStatus,
    remaining_seconds: u32,
    target_end_ms: Option<i64>,
    completed_focus_count_in_cycle: u32,
    active_task: Option<TaskContext>,
}

impl TimerState {
    /// Idle at the start of a focus phase
    pub fn new(settings: TimerSettings) -> Self {
        let remaining_seconds = settings.focus_seconds;
        Self {
            settings,
            mode: TimerMode::Focus,
            status: TimerStatus::Idle,
            remaining_seconds,
            target_end_ms: None,
            completed_focus_count_in_cycle: 0,
            active_task: None,
        }
    }

    /// Rebuild from a persisted snapshot.
    ///
    /// Always comes back idle with the full duration of the saved mode; a
    /// countdown from a previous process is never resumed.
    pub fn restored(mut settings: TimerSettings, persisted: &PersistedTimer) -> Self {
        if persisted.focus_duration_seconds > 0 {
            settings.focus_seconds = persisted.focus_duration_seconds;
        }

        let mode = match settings.policy {
            CyclePolicy::FocusOnly => TimerMode::Focus,
            CyclePolicy::Full { .. } => persisted.mode,
        };
        let completed = if settings
            .policy
            .accepts_count(persisted.completed_focus_count_in_cycle, mode)
        {
            persisted.completed_focus_count_in_cycle
        } else {
            0
        };

        let mut state = Self::new(settings);
        state.mode = mode;
        state.completed_focus_count_in_cycle = completed;
        state.remaining_seconds = state.duration_of(mode);
        state
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn target_end_ms(&self) -> Option<i64> {
        self.target_end_ms
    }

    pub fn completed_focus_count_in_cycle(&self) -> u32 {
        self.completed_focus_count_in_cycle
    }

    pub fn focus_duration_seconds(&self) -> u32 {
        self.settings.focus_seconds
    }

    pub fn active_task(&self) -> Option<&TaskContext> {
        self.active_task.as_ref()
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Full length of a phase under the current settings
    pub fn duration_of(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.settings.focus_seconds,
            TimerMode::ShortBreak => self.settings.short_break_seconds,
            TimerMode::LongBreak => self.settings.long_break_seconds,
        }
    }

    /// What the next expiry from the current mode would do
    pub fn upcoming_change(&self) -> PhaseChange {
        next_phase(
            self.mode,
            self.completed_focus_count_in_cycle,
            &self.settings.policy,
        )
    }

    /// Start the countdown. Only valid from idle.
    pub fn start(&mut self, now_ms: i64, task: Option<TaskContext>) -> bool {
        if self.status != TimerStatus::Idle {
            debug!("Ignoring start while {:?}", self.status);
            return false;
        }
        if task.is_some() {
            self.active_task = task;
        }
        self.run_from(now_ms);
        true
    }

    /// Freeze the remaining time. Only valid while running.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        if self.status != TimerStatus::Running {
            debug!("Ignoring pause while {:?}", self.status);
            return false;
        }
        if let Some(target) = self.target_end_ms.take() {
            self.remaining_seconds = remaining_seconds(target, now_ms);
        }
        self.status = TimerStatus::Paused;
        true
    }

    /// Re-anchor the frozen remaining time to now. Only valid while paused.
    pub fn resume(&mut self, now_ms: i64) -> bool {
        if self.status != TimerStatus::Paused {
            debug!("Ignoring resume while {:?}", self.status);
            return false;
        }
        self.run_from(now_ms);
        true
    }

    /// Back to idle with the full duration of the current mode. The cycle
    /// position is left alone.
    pub fn stop(&mut self) -> bool {
        if self.status == TimerStatus::Idle {
            debug!("Ignoring stop while idle");
            return false;
        }
        self.reset_to_idle();
        self.active_task = None;
        true
    }

    /// Leave a break early. Only valid while a break is the current mode.
    pub fn skip_break(&mut self, now_ms: i64) -> Option<PhaseChange> {
        if !self.mode.is_break() {
            debug!("Ignoring skip break during {:?}", self.mode);
            return None;
        }
        let keep_running = self.status == TimerStatus::Running;
        let change = self.upcoming_change();
        self.enter(change, now_ms, keep_running);
        Some(change)
    }

    /// Run the expiry transition now, whatever the remaining time
    pub fn force_end(&mut self, now_ms: i64) -> PhaseChange {
        let keep_running = self.status == TimerStatus::Running && !self.settings.manual_advance;
        let change = self.upcoming_change();
        self.enter(change, now_ms, keep_running);
        change
    }

    /// Running with a deadline at or behind `now`, expiry not yet applied
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.status == TimerStatus::Running
            && self.target_end_ms.is_some_and(|target| target <= now_ms)
    }

    /// Recompute remaining time from the wall clock.
    ///
    /// A target that is already behind `now` (long suspension, skipped ticks)
    /// yields exactly one transition, and the next phase is anchored at `now`.
    pub fn tick(&mut self, now_ms: i64) -> Tick {
        let Some(target) = self.target_end_ms else {
            return Tick::Idle;
        };

        let remaining = remaining_seconds(target, now_ms);
        self.remaining_seconds = remaining;
        if remaining > 0 {
            return Tick::Counting(remaining);
        }

        let keep_running = !self.settings.manual_advance;
        let change = self.upcoming_change();
        self.enter(change, now_ms, keep_running);
        Tick::Expired(change)
    }

    /// Change the focus length. An in-flight session keeps its remaining time;
    /// only an idle focus phase picks the new value up immediately.
    pub fn set_focus_duration(&mut self, minutes: u32) -> bool {
        if minutes == 0 {
            debug!("Ignoring non-positive focus duration");
            return false;
        }
        self.settings.focus_seconds = minutes.saturating_mul(60);
        if self.status == TimerStatus::Idle && self.mode == TimerMode::Focus {
            self.remaining_seconds = self.settings.focus_seconds;
        }
        true
    }

    /// Re-seed the cycle counter, e.g. after a client reload
    pub fn set_cycle_count(&mut self, count: u32) -> bool {
        if !self.settings.policy.accepts_count(count, self.mode) {
            debug!(
                "Ignoring out-of-range cycle count {} during {:?}",
                count, self.mode
            );
            return false;
        }
        self.completed_focus_count_in_cycle = count;
        true
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            status: self.status,
            remaining_seconds: self.remaining_seconds,
            completed_focus_count_in_cycle: self.completed_focus_count_in_cycle,
            focus_duration_seconds: self.settings.focus_seconds,
            sessions_per_cycle: self.settings.policy.sessions_per_cycle(),
            target_end_timestamp: self.target_end_ms,
            active_task: self.active_task.clone(),
        }
    }

    fn run_from(&mut self, now_ms: i64) {
        if self.remaining_seconds == 0 {
            self.remaining_seconds = self.duration_of(self.mode);
        }
        self.target_end_ms = Some(target_end(now_ms, self.remaining_seconds));
        self.status = TimerStatus::Running;
    }

    fn reset_to_idle(&mut self) {
        self.status = TimerStatus::Idle;
        self.target_end_ms = None;
        self.remaining_seconds = self.duration_of(self.mode);
    }

    fn enter(&mut self, change: PhaseChange, now_ms: i64, keep_running: bool) {
        self.mode = change.to;
        self.completed_focus_count_in_cycle = change.completed_focus_count_in_cycle;
        self.reset_to_idle();
        if keep_running {
            self.run_from(now_ms);
        }
    }
}
