//! Focus Timer - A background-durable Pomodoro timer authority
//!
//! This is the main entry point for the focus-timer application.

use std::{sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tracing::{info, warn};

use focus_timer::{
    api::create_router,
    bridge::TimerBridge,
    config::Config,
    presentation::{NoEffects, PresentationAdapter},
    services::{
        check_notify_send_available, DesktopNotifier, LogNotifier, NoopNotifier, NotificationSink,
    },
    state::{AppState, SnapshotStore, SystemClock},
    tasks::{notification_scheduler_task, timer_authority_task, TimerAuthority},
    utils::shutdown_signal,
};

const BROADCAST_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, focus={}min, short={}min, long={}min, cycle={}",
        config.host,
        config.port,
        config.focus_minutes,
        config.short_break_minutes,
        config.long_break_minutes,
        if config.focus_only {
            "focus-only".to_string()
        } else {
            config.sessions_per_cycle.to_string()
        }
    );

    // Pick a notification sink; a missing desktop degrades to logging
    let sink: Box<dyn NotificationSink> = if config.no_notifications {
        info!("Notifications disabled");
        Box::new(NoopNotifier)
    } else {
        match check_notify_send_available().await {
            Ok(()) => Box::new(DesktopNotifier),
            Err(e) => {
                warn!("{}", e);
                Box::new(LogNotifier)
            }
        }
    };

    let (notification_tx, notification_rx) = mpsc::unbounded_channel();
    tokio::spawn(notification_scheduler_task(notification_rx, SystemClock, sink));

    // Start the timer authority
    let bridge = TimerBridge::new(BROADCAST_CAPACITY);
    let mut authority = TimerAuthority::new(config.timer_settings(), SystemClock, bridge.attach()?)
        .with_notifications(notification_tx)
        .with_tick(config.tick());
    if let Some(path) = &config.state_file {
        authority = authority.with_store(SnapshotStore::new(path));
    }
    tokio::spawn(timer_authority_task(authority));

    // Rendered view for the status endpoint
    let (view_tx, view_rx) = watch::channel(None);
    let adapter_client = bridge.connect()?;
    tokio::spawn(PresentationAdapter::new(NoEffects).run(
        adapter_client,
        view_tx,
        Duration::from_secs(1),
    ));

    let state = Arc::new(AppState::new(bridge, view_rx, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start          - Start a phase (optional task JSON)");
    info!("  POST /timer/pause          - Pause the running phase");
    info!("  POST /timer/resume         - Resume a paused phase");
    info!("  POST /timer/stop           - Stop and reset the current phase");
    info!("  POST /timer/skip-break     - Leave the current break");
    info!("  POST /timer/skip-cycle     - End the current phase now");
    info!("  POST /timer/focus-duration - Set focus length in minutes");
    info!("  POST /timer/cycle-count    - Re-seed the cycle counter");
    info!("  POST /command              - Send any protocol command");
    info!("  GET  /status               - Current timer view");
    info!("  GET  /events               - Server-sent broadcast stream");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
