//! Focus/break cycle rules
//!
//! The transition table applied whenever a phase ends, whether by expiry or by
//! a forced end.

use serde::{Deserialize, Serialize};

/// Which phase is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }
}

/// How focus sessions are grouped into cycles.
///
/// `FocusOnly` is the degenerate cycle: no breaks, no counter, every phase is a
/// focus phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CyclePolicy {
    Full { sessions_per_cycle: u32 },
    FocusOnly,
}

impl CyclePolicy {
    pub fn standard() -> Self {
        Self::Full {
            sessions_per_cycle: 4,
        }
    }

    /// `None` means the cycle never owes a long break
    pub fn sessions_per_cycle(&self) -> Option<u32> {
        match self {
            Self::Full { sessions_per_cycle } => Some((*sessions_per_cycle).max(1)),
            Self::FocusOnly => None,
        }
    }

    /// Validates a cycle count for the given mode.
    ///
    /// `sessions_per_cycle` itself is only held during a long break; anywhere
    /// else the next focus expiry would push the counter past the cycle.
    pub fn accepts_count(&self, count: u32, mode: TimerMode) -> bool {
        match self.sessions_per_cycle() {
            Some(sessions) if mode == TimerMode::LongBreak => count <= sessions,
            Some(sessions) => count < sessions,
            None => count == 0,
        }
    }
}

impl Default for CyclePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Why a phase ended the way it did; drives notification text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    /// Focus finished, a short break follows
    FocusComplete,
    /// Last focus of the cycle finished, a long break follows
    CycleComplete,
    /// Short break finished
    BreakOver,
    /// Long break finished, counter back to zero
    CycleRestarted,
    /// Focus finished under the focus-only policy
    FocusRepeat,
}

/// Outcome of applying the transition table to one phase end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: TimerMode,
    pub to: TimerMode,
    pub kind: TransitionKind,
    pub completed_focus_count_in_cycle: u32,
}

/// Apply the transition table.
///
/// The counter increments only when a focus phase hands over to a break, and
/// drops back to zero when a long break ends.
pub fn next_phase(mode: TimerMode, completed: u32, policy: &CyclePolicy) -> PhaseChange {
    let Some(sessions) = policy.sessions_per_cycle() else {
        return PhaseChange {
            from: mode,
            to: TimerMode::Focus,
            kind: TransitionKind::FocusRepeat,
            completed_focus_count_in_cycle: 0,
        };
    };

    match mode {
        TimerMode::Focus => {
            let completed_after = completed + 1;
            if completed_after < sessions {
                PhaseChange {
                    from: mode,
                    to: TimerMode::ShortBreak,
                    kind: TransitionKind::FocusComplete,
                    completed_focus_count_in_cycle: completed_after,
                }
            } else {
                PhaseChange {
                    from: mode,
                    to: TimerMode::LongBreak,
                    kind: TransitionKind::CycleComplete,
                    completed_focus_count_in_cycle: completed_after,
                }
            }
        }
        TimerMode::ShortBreak => PhaseChange {
            from: mode,
            to: TimerMode::Focus,
            kind: TransitionKind::BreakOver,
            completed_focus_count_in_cycle: completed,
        },
        TimerMode::LongBreak => PhaseChange {
            from: mode,
            to: TimerMode::Focus,
            kind: TransitionKind::CycleRestarted,
            completed_focus_count_in_cycle: 0,
        },
    }
}
