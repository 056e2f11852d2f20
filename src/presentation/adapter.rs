//! Foreground presentation adapter
//!
//! Keeps a locally ticking copy of the timer for smooth rendering and folds
//! authoritative broadcasts into it without visible jitter.

use std::time::Duration;

use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    bridge::{Broadcast, TimerClient},
    state::{TimerMode, TimerSnapshot, TimerStatus},
};

/// Largest local/authoritative difference, in seconds, left uncorrected
pub const DRIFT_TOLERANCE_SECS: u32 = 1;

/// One-shot side effects of a phase boundary (sounds, point awards, ...)
pub trait TransitionEffects: Send + 'static {
    fn on_cycle_end(&mut self, next_mode: TimerMode, completed_focus_count_in_cycle: u32);
}

/// No transition effects
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl TransitionEffects for NoEffects {
    fn on_cycle_end(&mut self, _next_mode: TimerMode, _completed_focus_count_in_cycle: u32) {}
}

/// What `apply` did with a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Authoritative remaining time replaced the local one
    Adopted,
    /// Local remaining time was within tolerance and kept
    KeptLocal,
    /// A phase boundary; transition effects were fired
    PhaseEnded,
}

pub struct PresentationAdapter<E: TransitionEffects> {
    view: Option<TimerSnapshot>,
    effects: E,
}

impl<E: TransitionEffects> PresentationAdapter<E> {
    pub fn new(effects: E) -> Self {
        Self {
            view: None,
            effects,
        }
    }

    /// What the view should render; `None` until the first sync arrives
    pub fn view(&self) -> Option<&TimerSnapshot> {
        self.view.as_ref()
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Advance the local countdown by one second.
    ///
    /// Never crosses zero and never fires transition effects; the phase change
    /// itself only comes from the authority.
    pub fn local_tick(&mut self) -> bool {
        match self.view.as_mut() {
            Some(view) if view.status == TimerStatus::Running && view.remaining_seconds > 0 => {
                view.remaining_seconds -= 1;
                true
            }
            _ => false,
        }
    }

    /// Fold one authoritative broadcast into the local view
    pub fn apply(&mut self, event: Broadcast) -> Reconciliation {
        match event {
            Broadcast::CycleEnd {
                next_mode,
                completed_focus_count_in_cycle,
            } => {
                info!("Phase ended, next up: {}", next_mode.label());
                self.effects
                    .on_cycle_end(next_mode, completed_focus_count_in_cycle);
                Reconciliation::PhaseEnded
            }
            Broadcast::TimerState(authoritative) => self.reconcile(authoritative),
        }
    }

    fn reconcile(&mut self, authoritative: TimerSnapshot) -> Reconciliation {
        let keep_local = match &self.view {
            Some(local) => {
                authoritative.status == TimerStatus::Running
                    && local.status == authoritative.status
                    && local.mode == authoritative.mode
                    && local.remaining_seconds.abs_diff(authoritative.remaining_seconds)
                        <= DRIFT_TOLERANCE_SECS
            }
            None => false,
        };

        if keep_local {
            let local_remaining = self
                .view
                .as_ref()
                .map(|v| v.remaining_seconds)
                .unwrap_or(authoritative.remaining_seconds);
            self.view = Some(TimerSnapshot {
                remaining_seconds: local_remaining,
                ..authoritative
            });
            Reconciliation::KeptLocal
        } else {
            if let Some(local) = &self.view {
                if local.remaining_seconds != authoritative.remaining_seconds {
                    debug!(
                        "Correcting local countdown {}s -> {}s",
                        local.remaining_seconds, authoritative.remaining_seconds
                    );
                }
            }
            self.view = Some(authoritative);
            Reconciliation::Adopted
        }
    }

    /// Drive the adapter from a client connection, publishing every change of
    /// the rendered view on `view_tx`. Returns when the bridge is gone.
    pub async fn run(
        mut self,
        mut client: TimerClient,
        view_tx: watch::Sender<Option<TimerSnapshot>>,
        tick: Duration,
    ) {
        let mut ticker = interval(tick.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = client.recv() => {
                    match event {
                        Some(event) => {
                            self.apply(event);
                            view_tx.send_replace(self.view.clone());
                        }
                        None => {
                            info!("Bridge closed, stopping presentation adapter");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    if self.local_tick() {
                        view_tx.send_replace(self.view.clone());
                    }
                }
            }
        }
    }
}
