use focus_timer::bridge::{Broadcast, Command, Request, TimerBridge};
use focus_timer::services::NotificationRequest;
use focus_timer::state::{
    ManualClock, SnapshotStore, TaskContext, TimerMode, TimerSettings, TimerSnapshot, TimerStatus,
};
use focus_timer::tasks::TimerAuthority;
use tokio::sync::{broadcast, mpsc, oneshot};

const T0: i64 = 1_700_000_000_000;

struct Harness {
    authority: TimerAuthority<ManualClock>,
    clock: ManualClock,
    events: broadcast::Receiver<Broadcast>,
    notifications: mpsc::UnboundedReceiver<NotificationRequest>,
    _bridge: TimerBridge,
}

impl Harness {
    fn new(settings: TimerSettings) -> Self {
        let clock = ManualClock::new(T0);
        let bridge = TimerBridge::new(256);
        let events = bridge.subscribe();
        let (notification_tx, notifications) = mpsc::unbounded_channel();
        let authority = TimerAuthority::new(
            settings,
            clock.clone(),
            bridge.attach().expect("attach authority"),
        )
        .with_notifications(notification_tx);

        Self {
            authority,
            clock,
            events,
            notifications,
            _bridge: bridge,
        }
    }

    fn command(&mut self, command: Command) -> TimerSnapshot {
        self.authority.handle_command(command);
        self.authority.snapshot()
    }

    fn drain_events(&mut self) -> Vec<Broadcast> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    fn drain_notifications(&mut self) -> Vec<NotificationRequest> {
        let mut out = Vec::new();
        while let Ok(request) = self.notifications.try_recv() {
            out.push(request);
        }
        out
    }
}

fn short_phases() -> TimerSettings {
    TimerSettings {
        focus_seconds: 10,
        short_break_seconds: 3,
        long_break_seconds: 5,
        ..TimerSettings::default()
    }
}

#[test]
fn missed_ticks_expire_once_without_negative_time() {
    let mut h = Harness::new(short_phases());
    h.command(Command::start());
    h.drain_events();

    // 15s pass with no ticks delivered at all
    h.clock.advance_secs(15);
    h.authority.on_tick();

    let events = h.drain_events();
    assert_eq!(events.len(), 2, "one CYCLE_END and one TIMER_STATE: {:?}", events);
    assert_eq!(
        events[0],
        Broadcast::CycleEnd {
            next_mode: TimerMode::ShortBreak,
            completed_focus_count_in_cycle: 1,
        }
    );
    let state = events[1].snapshot().expect("state broadcast");
    assert_eq!(state.mode, TimerMode::ShortBreak);
    assert_eq!(state.remaining_seconds, 3);
    assert_eq!(state.status, TimerStatus::Running);
}

#[test]
fn tick_recomputes_from_wall_clock() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());

    h.clock.advance_ms(61_500);
    h.authority.on_tick();
    assert_eq!(h.authority.snapshot().remaining_seconds, 1439);
}

#[test]
fn four_focus_expiries_owe_a_long_break() {
    let mut h = Harness::new(short_phases());
    h.command(Command::start());
    h.drain_events();

    let mut next_modes = Vec::new();
    for _ in 0..4 {
        // focus runs out
        h.clock.advance_secs(10);
        h.authority.on_tick();
        // then its break
        let break_len = match h.authority.snapshot().mode {
            TimerMode::ShortBreak => 3,
            TimerMode::LongBreak => 5,
            TimerMode::Focus => panic!("expected a break"),
        };
        h.clock.advance_secs(break_len);
        h.authority.on_tick();

        for event in h.drain_events() {
            if let Broadcast::CycleEnd { next_mode, .. } = event {
                next_modes.push(next_mode);
            }
        }
    }

    let breaks: Vec<TimerMode> = next_modes
        .iter()
        .copied()
        .filter(|mode| mode.is_break())
        .collect();
    assert_eq!(
        breaks,
        vec![
            TimerMode::ShortBreak,
            TimerMode::ShortBreak,
            TimerMode::ShortBreak,
            TimerMode::LongBreak
        ]
    );

    let state = h.authority.snapshot();
    assert_eq!(state.mode, TimerMode::Focus);
    assert_eq!(state.completed_focus_count_in_cycle, 0);
}

#[test]
fn pause_resume_conserves_time() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());

    h.clock.advance_secs(100);
    h.authority.on_tick();
    assert_eq!(h.authority.snapshot().remaining_seconds, 1400);

    let paused = h.command(Command::PauseTimer);
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_seconds, 1400);
    assert_eq!(paused.target_end_timestamp, None);

    h.clock.advance_secs(100);
    h.authority.on_tick();
    let resumed = h.command(Command::ResumeTimer);
    assert_eq!(resumed.remaining_seconds, 1400);
    assert_eq!(resumed.target_end_timestamp, Some(T0 + 200_000 + 1_400_000));

    h.clock.advance_secs(1);
    h.authority.on_tick();
    assert_eq!(h.authority.snapshot().remaining_seconds, 1399);
}

#[test]
fn stopping_twice_equals_stopping_once() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::SetCycleCount { count: 2 });
    h.command(Command::start());
    h.clock.advance_secs(42);
    h.authority.on_tick();

    let once = h.command(Command::StopTimer);
    let twice = h.command(Command::StopTimer);
    assert_eq!(once, twice);
    assert_eq!(twice.status, TimerStatus::Idle);
    assert_eq!(twice.remaining_seconds, 1500);
    assert_eq!(twice.completed_focus_count_in_cycle, 2);
}

#[test]
fn pause_cancels_the_scheduled_notification() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());

    let scheduled = match h.drain_notifications().as_slice() {
        [NotificationRequest::Schedule(notification)] => notification.clone(),
        other => panic!("expected one schedule, got {:?}", other),
    };
    assert_eq!(scheduled.fire_at_ms, T0 + 1_500_000);
    assert_eq!(scheduled.title, "Focus complete");

    h.clock.advance_secs(30);
    h.command(Command::PauseTimer);
    assert_eq!(
        h.drain_notifications(),
        vec![NotificationRequest::Cancel { id: scheduled.id }]
    );

    // Resuming schedules a fresh one at the re-derived end time
    h.clock.advance_secs(30);
    h.command(Command::ResumeTimer);
    match h.drain_notifications().as_slice() {
        [NotificationRequest::Schedule(notification)] => {
            assert_ne!(notification.id, scheduled.id);
            assert_eq!(notification.fire_at_ms, T0 + 60_000 + 1_470_000);
        }
        other => panic!("expected reschedule, got {:?}", other),
    }
}

#[test]
fn stop_and_skip_cancel_pending_notifications() {
    let mut h = Harness::new(short_phases());
    h.command(Command::start());
    h.command(Command::StopTimer);
    let requests = h.drain_notifications();
    assert!(matches!(requests.last(), Some(NotificationRequest::Cancel { .. })));

    h.command(Command::start());
    h.command(Command::SkipCycle);
    let requests = h.drain_notifications();
    // schedule(focus), cancel(focus), schedule(short break)
    assert_eq!(requests.len(), 3, "{:?}", requests);
    assert!(matches!(requests[1], NotificationRequest::Cancel { .. }));
    match &requests[2] {
        NotificationRequest::Schedule(notification) => {
            assert_eq!(notification.title, "Break over");
            assert_eq!(notification.fire_at_ms, T0 + 3_000);
        }
        other => panic!("expected break schedule, got {:?}", other),
    }
}

#[test]
fn expiry_does_not_cancel_the_due_notification() {
    let mut h = Harness::new(short_phases());
    h.command(Command::start());
    h.drain_notifications();

    h.clock.advance_secs(10);
    h.authority.on_tick();
    let requests = h.drain_notifications();
    assert!(
        requests
            .iter()
            .all(|r| matches!(r, NotificationRequest::Schedule(_))),
        "{:?}",
        requests
    );
}

#[test]
fn focus_duration_change_is_isolated_from_running_session() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());
    h.clock.advance_secs(500);
    h.authority.on_tick();
    assert_eq!(h.authority.snapshot().remaining_seconds, 1000);

    let state = h.command(Command::SetFocusDuration { minutes: 10 });
    assert_eq!(state.remaining_seconds, 1000);
    assert_eq!(state.focus_duration_seconds, 600);

    h.command(Command::StopTimer);
    let restarted = h.command(Command::start());
    assert_eq!(restarted.remaining_seconds, 600);
}

#[test]
fn invalid_commands_still_broadcast_state() {
    let mut h = Harness::new(TimerSettings::default());
    h.drain_events();

    h.command(Command::PauseTimer);
    h.command(Command::SkipBreak);
    h.command(Command::SetFocusDuration { minutes: 0 });
    h.command(Command::SetCycleCount { count: 9 });

    let events = h.drain_events();
    assert_eq!(events.len(), 4);
    for event in events {
        let state = event.snapshot().expect("state broadcast");
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.remaining_seconds, 1500);
        assert_eq!(state.completed_focus_count_in_cycle, 0);
    }
    assert!(h.drain_notifications().is_empty());
}

#[test]
fn task_title_flows_into_notification_text() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::SetCycleCount { count: 3 });
    h.command(Command::StartTimer {
        task: Some(TaskContext {
            task_id: "t-9".to_string(),
            subtask_id: Some("t-9.2".to_string()),
            title: Some("Quarterly review".to_string()),
        }),
    });

    match h.drain_notifications().as_slice() {
        [NotificationRequest::Schedule(notification)] => {
            assert_eq!(notification.title, "Cycle complete");
            assert!(notification.body.contains("Quarterly review"));
        }
        other => panic!("expected one schedule, got {:?}", other),
    }
    assert_eq!(
        h.authority.snapshot().active_task.map(|t| t.task_id),
        Some("t-9".to_string())
    );
}

#[test]
fn restarted_authority_comes_back_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.json");

    {
        let mut h = Harness::new(short_phases());
        let mut authority = h.authority;
        authority = authority.with_store(SnapshotStore::new(&path));
        h.authority = authority;

        h.command(Command::start());
        h.clock.advance_secs(10);
        h.authority.on_tick();
        let state = h.authority.snapshot();
        assert_eq!(state.mode, TimerMode::ShortBreak);
        assert_eq!(state.status, TimerStatus::Running);
    }

    let h = Harness::new(short_phases());
    let authority = h.authority.with_store(SnapshotStore::new(&path));
    let state = authority.snapshot();
    assert_eq!(state.mode, TimerMode::ShortBreak);
    assert_eq!(state.status, TimerStatus::Idle);
    assert_eq!(state.remaining_seconds, 3);
    assert_eq!(state.target_end_timestamp, None);
    assert_eq!(state.completed_focus_count_in_cycle, 1);
}

#[test]
fn focus_only_policy_repeats_focus() {
    let mut h = Harness::new(TimerSettings {
        focus_seconds: 10,
        policy: focus_timer::state::CyclePolicy::FocusOnly,
        ..TimerSettings::default()
    });
    h.command(Command::start());
    for _ in 0..5 {
        h.clock.advance_secs(10);
        h.authority.on_tick();
        let state = h.authority.snapshot();
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(state.completed_focus_count_in_cycle, 0);
        assert_eq!(state.sessions_per_cycle, None);
    }

    // No break to skip
    let state = h.command(Command::SkipBreak);
    assert_eq!(state.mode, TimerMode::Focus);
}

#[test]
fn pause_after_unticked_deadline_settles_the_phase_first() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());
    h.drain_events();

    // Deadline passes; the command wins the race against the next tick
    h.clock.advance_secs(1501);
    let paused = h.command(Command::PauseTimer);
    assert_eq!(paused.mode, TimerMode::ShortBreak);
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_seconds, 300);
    assert_eq!(paused.completed_focus_count_in_cycle, 1);

    let resumed = h.command(Command::ResumeTimer);
    assert_eq!(resumed.mode, TimerMode::ShortBreak);
    assert_eq!(resumed.remaining_seconds, 300);
    assert_eq!(resumed.completed_focus_count_in_cycle, 1);

    let cycle_ends = h
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, Broadcast::CycleEnd { .. }))
        .count();
    assert_eq!(cycle_ends, 1);
}

#[test]
fn overdue_phase_under_manual_advance_lands_idle_before_command() {
    let mut h = Harness::new(TimerSettings {
        manual_advance: true,
        ..short_phases()
    });
    h.command(Command::start());
    h.clock.advance_secs(30);

    let state = h.command(Command::PauseTimer);
    assert_eq!(state.mode, TimerMode::ShortBreak);
    assert_eq!(state.status, TimerStatus::Idle);
    assert_eq!(state.remaining_seconds, 3);
    assert_eq!(state.completed_focus_count_in_cycle, 1);
}

#[test]
fn reply_reflects_the_command_not_an_earlier_tick() {
    let mut h = Harness::new(TimerSettings::default());
    h.command(Command::start());
    h.drain_events();

    // A running tick is already queued for every subscriber
    h.clock.advance_secs(5);
    h.authority.on_tick();

    let (reply_tx, mut reply_rx) = oneshot::channel();
    h.authority.handle_request(Request {
        command: Command::PauseTimer,
        reply: Some(reply_tx),
    });

    let first_broadcast = h.drain_events().remove(0);
    assert_eq!(
        first_broadcast.snapshot().map(|s| s.status),
        Some(TimerStatus::Running)
    );

    let answer = reply_rx.try_recv().expect("reply sent");
    assert_eq!(answer.status, TimerStatus::Paused);
    assert_eq!(answer.remaining_seconds, 1495);
}
