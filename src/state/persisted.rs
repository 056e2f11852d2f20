//! Snapshot persistence across authority restarts
//!
//! Only the cycle position and focus length survive a restart. The countdown
//! itself is deliberately not stored: a restarted authority comes back idle.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cycle::TimerMode;
use super::timer_state::TimerState;
use crate::error::{Result, TimerError};

/// On-disk form of the timer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimer {
    pub mode: TimerMode,
    pub completed_focus_count_in_cycle: u32,
    pub focus_duration_seconds: u32,
    pub saved_at: DateTime<Utc>,
}

impl PersistedTimer {
    pub fn capture(state: &TimerState) -> Self {
        Self {
            mode: state.mode(),
            completed_focus_count_in_cycle: state.completed_focus_count_in_cycle(),
            focus_duration_seconds: state.focus_duration_seconds(),
            saved_at: Utc::now(),
        }
    }
}

/// JSON file holding the last persisted snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the snapshot. A missing file is not an error.
    pub fn load(&self) -> Result<Option<PersistedTimer>> {
        if !self.path.exists() {
            debug!("No timer snapshot at {}", self.path.display());
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let persisted = serde_json::from_str(&contents)?;
        Ok(Some(persisted))
    }

    /// Load, logging and discarding anything unreadable
    pub fn load_or_discard(&self) -> Option<PersistedTimer> {
        match self.load() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!("Ignoring unreadable timer snapshot {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, state: &TimerState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&PersistedTimer::capture(state))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            TimerError::Persistence(format!(
                "failed to move snapshot into {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}
