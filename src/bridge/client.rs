//! Command queue and broadcast fan-out between clients and the authority

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc, oneshot,
};
use tracing::{debug, info, warn};

use super::protocol::{Broadcast, Command};
use crate::error::{Result, TimerError};
use crate::state::TimerSnapshot;

/// What happened to a command handed to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the attached authority
    Sent,
    /// No authority reachable; held until one attaches
    Queued,
}

/// A command on its way to the authority.
///
/// `reply`, when present, receives the state right after this command was
/// applied, which a later broadcast from a tick can't be confused with.
#[derive(Debug)]
pub struct Request {
    pub command: Command,
    pub reply: Option<oneshot::Sender<TimerSnapshot>>,
}

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        Self {
            command,
            reply: None,
        }
    }
}

#[derive(Debug, Default)]
struct BridgeInner {
    authority: Option<mpsc::UnboundedSender<Request>>,
    pending: VecDeque<Request>,
}

/// Shared rendezvous point for clients and the authority.
///
/// Cheap to clone. Commands are fire-and-forget; state flows back only through
/// broadcasts.
#[derive(Debug, Clone)]
pub struct TimerBridge {
    inner: Arc<Mutex<BridgeInner>>,
    broadcast_tx: broadcast::Sender<Broadcast>,
}

/// The authority's half of the bridge
#[derive(Debug)]
pub struct AuthorityEndpoint {
    pub commands: mpsc::UnboundedReceiver<Request>,
    pub broadcasts: broadcast::Sender<Broadcast>,
}

impl TimerBridge {
    pub fn new(broadcast_capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            inner: Arc::new(Mutex::new(BridgeInner::default())),
            broadcast_tx,
        }
    }

    /// Attach an authority, replacing any previous one.
    ///
    /// Commands queued while no authority was reachable are delivered first,
    /// in the order they were sent.
    pub fn attach(&self) -> Result<AuthorityEndpoint> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock()?;

        let flushed = inner.pending.len();
        while let Some(request) = inner.pending.pop_front() {
            // Receiver is alive in this scope
            let _ = tx.send(request);
        }
        inner.authority = Some(tx);
        drop(inner);

        info!("Timer authority attached, {} queued commands delivered", flushed);
        Ok(AuthorityEndpoint {
            commands: rx,
            broadcasts: self.broadcast_tx.clone(),
        })
    }

    /// Send a command, queueing it if no authority is reachable
    pub fn send(&self, command: Command) -> Result<Delivery> {
        self.enqueue(Request::from(command))
    }

    /// Send a command and get a receiver for the state it produces.
    ///
    /// A queued command is answered once an authority attaches and runs it.
    pub fn request(
        &self,
        command: Command,
    ) -> Result<(Delivery, oneshot::Receiver<TimerSnapshot>)> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let delivery = self.enqueue(Request {
            command,
            reply: Some(reply_tx),
        })?;
        Ok((delivery, reply_rx))
    }

    fn enqueue(&self, request: Request) -> Result<Delivery> {
        let mut inner = self.lock()?;

        if let Some(authority) = inner.authority.clone() {
            match authority.send(request) {
                Ok(()) => return Ok(Delivery::Sent),
                Err(mpsc::error::SendError(request)) => {
                    warn!(
                        "Timer authority went away, queueing {}",
                        request.command.name()
                    );
                    inner.authority = None;
                    inner.pending.push_back(request);
                    return Ok(Delivery::Queued);
                }
            }
        }

        debug!(
            "No timer authority attached, queueing {}",
            request.command.name()
        );
        inner.pending.push_back(request);
        Ok(Delivery::Queued)
    }

    /// Connect a new client. It asks for a full state sync straight away.
    pub fn connect(&self) -> Result<TimerClient> {
        let client = TimerClient {
            bridge: self.clone(),
            events: self.broadcast_tx.subscribe(),
        };
        client.resync()?;
        Ok(client)
    }

    /// Raw broadcast receiver without the sync-on-connect handshake
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcast_tx.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.lock()
            .map(|inner| inner.authority.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }

    pub fn pending_len(&self) -> usize {
        self.lock().map(|inner| inner.pending.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BridgeInner>> {
        self.inner
            .lock()
            .map_err(|e| TimerError::Bridge(format!("failed to lock bridge: {}", e)))
    }
}

/// A foreground view's connection to the authority
#[derive(Debug)]
pub struct TimerClient {
    bridge: TimerBridge,
    events: broadcast::Receiver<Broadcast>,
}

impl TimerClient {
    pub fn send(&self, command: Command) -> Result<Delivery> {
        self.bridge.send(command)
    }

    /// Request an immediate full state broadcast
    pub fn resync(&self) -> Result<Delivery> {
        self.bridge.send(Command::SyncState)
    }

    /// Next broadcast, or `None` once the bridge is gone.
    ///
    /// A client that fell behind skips what it missed and asks for a fresh
    /// snapshot instead.
    pub async fn recv(&mut self) -> Option<Broadcast> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Client lagged by {} broadcasts, resyncing", missed);
                    if let Err(e) = self.resync() {
                        warn!("Failed to request resync: {}", e);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Skip ahead to the next `TIMER_STATE`
    pub async fn next_state(&mut self) -> Option<TimerSnapshot> {
        loop {
            if let Broadcast::TimerState(snapshot) = self.recv().await? {
                return Some(snapshot);
            }
        }
    }
}
