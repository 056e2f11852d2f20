//! Timer authority background task
//!
//! The only owner of `TimerState`. Commands and interval ticks are handled on a
//! single task, so a phase expiry can never interleave with a command.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, trace, warn};

use crate::{
    bridge::{AuthorityEndpoint, Broadcast, Command, Request},
    services::{phase_end_text, Notification, NotificationId, NotificationRequest},
    state::{
        Clock, PhaseChange, SnapshotStore, Tick, TimerSettings, TimerSnapshot, TimerState,
        TimerStatus,
    },
};

/// Keeps track of the one notification describing the current phase
#[derive(Debug)]
struct PhaseNotifier {
    requests: Option<mpsc::UnboundedSender<NotificationRequest>>,
    current: Option<NotificationId>,
    next_id: u64,
}

impl PhaseNotifier {
    fn new(requests: Option<mpsc::UnboundedSender<NotificationRequest>>) -> Self {
        Self {
            requests,
            current: None,
            next_id: 1,
        }
    }

    /// Replace whatever is scheduled with a new notification
    fn schedule(&mut self, title: String, body: String, fire_at_ms: i64) {
        self.cancel();
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        if self.send(NotificationRequest::Schedule(Notification {
            id,
            title,
            body,
            fire_at_ms,
        })) {
            self.current = Some(id);
        }
    }

    fn cancel(&mut self) {
        if let Some(id) = self.current.take() {
            self.send(NotificationRequest::Cancel { id });
        }
    }

    /// The current notification is due and will fire on its own
    fn release(&mut self) {
        self.current = None;
    }

    fn send(&mut self, request: NotificationRequest) -> bool {
        let Some(requests) = &self.requests else {
            return false;
        };
        if requests.send(request).is_err() {
            debug!("Notification scheduler is gone, notifications disabled");
            self.requests = None;
            return false;
        }
        true
    }
}

/// Background timer authority
pub struct TimerAuthority<C: Clock> {
    state: TimerState,
    clock: C,
    endpoint: AuthorityEndpoint,
    notifier: PhaseNotifier,
    store: Option<SnapshotStore>,
    tick: Duration,
}

impl<C: Clock> TimerAuthority<C> {
    pub fn new(settings: TimerSettings, clock: C, endpoint: AuthorityEndpoint) -> Self {
        Self {
            state: TimerState::new(settings),
            clock,
            endpoint,
            notifier: PhaseNotifier::new(None),
            store: None,
            tick: Duration::from_secs(1),
        }
    }

    /// Send notification requests to a scheduler task
    pub fn with_notifications(
        mut self,
        requests: mpsc::UnboundedSender<NotificationRequest>,
    ) -> Self {
        self.notifier = PhaseNotifier::new(Some(requests));
        self
    }

    /// Persist to `store` and restore from it now, if it holds a snapshot
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        if let Some(persisted) = store.load_or_discard() {
            info!(
                "Restored timer in {:?} mode, {} focus sessions into the cycle",
                persisted.mode, persisted.completed_focus_count_in_cycle
            );
            self.state = TimerState::restored(self.state.settings().clone(), &persisted);
        }
        self.store = Some(store);
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.state.snapshot()
    }

    /// Apply one command and broadcast the resulting state.
    ///
    /// Commands that are invalid in the current state change nothing, but the
    /// state is still broadcast so the sender can reconcile.
    pub fn handle_command(&mut self, command: Command) {
        let now = self.clock.now_ms();
        debug!("Handling {}", command.name());

        // A deadline that passed between ticks is settled before the command
        // sees the state, otherwise pause/resume would restart the same phase
        if self.state.is_overdue(now) {
            debug!("Phase ran out before {}, expiring first", command.name());
            self.on_tick();
        }

        let changed = match command {
            Command::StartTimer { task } => {
                let started = self.state.start(now, task);
                if started {
                    info!(
                        "Started {} phase, {}s remaining",
                        self.state.mode().label(),
                        self.state.remaining_seconds()
                    );
                    self.schedule_phase_end();
                }
                started
            }
            Command::PauseTimer => {
                let paused = self.state.pause(now);
                if paused {
                    info!("Paused with {}s remaining", self.state.remaining_seconds());
                    self.notifier.cancel();
                }
                paused
            }
            Command::ResumeTimer => {
                let resumed = self.state.resume(now);
                if resumed {
                    info!("Resumed with {}s remaining", self.state.remaining_seconds());
                    self.schedule_phase_end();
                }
                resumed
            }
            Command::StopTimer => {
                let stopped = self.state.stop();
                if stopped {
                    info!("Stopped, back to idle {} phase", self.state.mode().label());
                    self.notifier.cancel();
                }
                stopped
            }
            Command::SkipBreak => match self.state.skip_break(now) {
                Some(change) => {
                    info!("Skipped {} phase", change.from.label());
                    self.notifier.cancel();
                    self.announce(change);
                    true
                }
                None => false,
            },
            Command::SkipCycle => {
                let change = self.state.force_end(now);
                info!("Forced end of {} phase", change.from.label());
                self.notifier.cancel();
                self.announce(change);
                true
            }
            Command::SetFocusDuration { minutes } => {
                let updated = self.state.set_focus_duration(minutes);
                if updated {
                    info!("Focus duration set to {} minutes", minutes);
                }
                updated
            }
            Command::SetCycleCount { count } => {
                let updated = self.state.set_cycle_count(count);
                if updated {
                    info!("Cycle count set to {}", count);
                    // Phase-end text depends on the count
                    if self.state.status() == TimerStatus::Running {
                        self.schedule_phase_end();
                    }
                }
                updated
            }
            Command::SyncState => false,
        };

        if changed {
            self.persist();
        }
        self.broadcast_state();
    }

    /// Apply a command and answer its reply channel, if it has one
    pub fn handle_request(&mut self, request: Request) {
        self.handle_command(request.command);
        if let Some(reply) = request.reply {
            if reply.send(self.state.snapshot()).is_err() {
                trace!("Requester stopped waiting");
            }
        }
    }

    /// One interval firing: recompute from the wall clock and handle expiry
    pub fn on_tick(&mut self) {
        match self.state.tick(self.clock.now_ms()) {
            Tick::Idle => {}
            Tick::Counting(remaining) => {
                trace!("{}s remaining", remaining);
                self.broadcast_state();
            }
            Tick::Expired(change) => {
                info!(
                    "{} phase expired, entering {}",
                    change.from.label(),
                    change.to.label()
                );
                self.notifier.release();
                self.announce(change);
                self.persist();
                self.broadcast_state();
            }
        }
    }

    /// Run until every command sender is gone
    pub async fn run(mut self) {
        info!(
            "Starting timer authority in {} mode ({:?})",
            self.state.mode().label(),
            self.state.status()
        );

        let mut ticker = interval(self.tick);
        // A suspended host must not produce a burst of catch-up ticks
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.broadcast_state();

        loop {
            tokio::select! {
                request = self.endpoint.commands.recv() => {
                    match request {
                        Some(request) => self.handle_request(request),
                        None => {
                            info!("Command channel closed, stopping timer authority");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => self.on_tick(),
            }
        }
    }

    fn announce(&mut self, change: PhaseChange) {
        self.send(Broadcast::CycleEnd {
            next_mode: change.to,
            completed_focus_count_in_cycle: change.completed_focus_count_in_cycle,
        });
        if self.state.status() == TimerStatus::Running {
            self.schedule_phase_end();
        }
    }

    fn schedule_phase_end(&mut self) {
        let Some(target) = self.state.target_end_ms() else {
            return;
        };
        let change = self.state.upcoming_change();
        let (title, body) = phase_end_text(change.kind, self.state.active_task());
        self.notifier.schedule(title, body, target);
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.state) {
                warn!("Failed to persist timer snapshot: {}", e);
            }
        }
    }

    fn broadcast_state(&self) {
        self.send(Broadcast::TimerState(self.state.snapshot()));
    }

    fn send(&self, event: Broadcast) {
        if self.endpoint.broadcasts.send(event).is_err() {
            trace!("No clients connected");
        }
    }
}

/// Background task that owns the timer until the bridge goes away
pub async fn timer_authority_task<C: Clock>(authority: TimerAuthority<C>) {
    authority.run().await;
}
