//! HTTP-facing application state

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, time::timeout};
use tracing::{debug, info};

use super::TimerSnapshot;
use crate::{
    bridge::{Command, Delivery, TimerBridge},
    error::Result,
};

/// How long a handler waits for the authority's answering broadcast
const RECONCILE_TIMEOUT: Duration = Duration::from_millis(500);

/// State shared by the HTTP handlers.
///
/// Handlers never touch the timer directly: they send commands over the bridge
/// and read the presentation adapter's view.
#[derive(Debug)]
pub struct AppState {
    pub bridge: TimerBridge,
    /// Rendered view kept current by the presentation adapter
    pub view: watch::Receiver<Option<TimerSnapshot>>,
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Most recent command name sent through the HTTP shell, and when
    last_command: Mutex<Option<(&'static str, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        bridge: TimerBridge,
        view: watch::Receiver<Option<TimerSnapshot>>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            bridge,
            view,
            start_time: Instant::now(),
            port,
            host,
            last_command: Mutex::new(None),
        }
    }

    /// Send a command and wait briefly for the state it produced.
    ///
    /// Falls back to the last rendered view when the command was queued or the
    /// authority is slow to answer.
    pub async fn dispatch(&self, command: Command) -> Result<(Delivery, Option<TimerSnapshot>)> {
        let name = command.name();
        let (delivery, reply) = self.bridge.request(command)?;
        self.record_action(name);
        info!("{} dispatched ({:?})", name, delivery);

        if delivery == Delivery::Queued {
            return Ok((delivery, self.current_view()));
        }

        match timeout(RECONCILE_TIMEOUT, reply).await {
            Ok(Ok(snapshot)) => Ok((delivery, Some(snapshot))),
            _ => {
                debug!("No answer to {} in time, using last view", name);
                Ok((delivery, self.current_view()))
            }
        }
    }

    pub fn current_view(&self) -> Option<TimerSnapshot> {
        self.view.borrow().clone()
    }

    fn record_action(&self, command: &'static str) {
        if let Ok(mut last) = self.last_command.lock() {
            *last = Some((command, Utc::now()));
        }
    }

    /// Server uptime as `1h 2m 3s`, dropping leading zero units
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        match (secs / 3600, secs % 3600 / 60, secs % 60) {
            (0, 0, s) => format!("{}s", s),
            (0, m, s) => format!("{}m {}s", m, s),
            (h, m, s) => format!("{}h {}m {}s", h, m, s),
        }
    }

    /// Name and time of the last command dispatched over HTTP
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_command.lock().ok().and_then(|last| *last) {
            Some((name, at)) => (Some(name.to_string()), Some(at)),
            None => (None, None),
        }
    }
}
