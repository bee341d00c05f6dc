use std::fmt;
use std::time::{Duration, Instant};

use racer::{ClientMessage, ServerMessage};

use crate::session::Task;
use crate::timer::{Scheduler, TaskHandle};

use super::TransportError;

/// Distinguishes successive connection attempts so late events from an
/// abandoned link cannot touch the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attempt(pub u64);

impl Attempt {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Text(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub attempt: Attempt,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(attempt: Attempt, kind: TransportEventKind) -> Self {
        Self { attempt, kind }
    }
}

/// Write half of one live connection attempt.
pub trait Link {
    fn send(&mut self, text: String) -> Result<(), TransportError>;
    fn close(&mut self);
}

/// Opens connection attempts. Progress of each attempt is reported back
/// asynchronously as [`TransportEvent`]s tagged with the attempt.
pub trait Connector {
    type Link: Link;

    fn open(&mut self, endpoint: &str, attempt: Attempt) -> Self::Link;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Open => "Connected - Race Started!",
        }
    }
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    endpoint: String,
    reconnect_delay: Duration,
    link: Option<C::Link>,
    attempt: Attempt,
    state: ConnectionState,
    reconnect: Option<TaskHandle>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, endpoint: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            connector,
            endpoint: endpoint.into(),
            reconnect_delay,
            link: None,
            attempt: Attempt::default(),
            state: ConnectionState::Disconnected,
            reconnect: None,
        }
    }

    /// Starts a fresh connection attempt, abandoning any previous link.
    pub fn connect(&mut self) {
        if let Some(mut old) = self.link.take() {
            old.close();
        }

        self.attempt = self.attempt.next();
        self.reconnect = None;
        log::info!("Connecting to {} (attempt {})", self.endpoint, self.attempt);

        self.link = Some(self.connector.open(&self.endpoint, self.attempt));
        self.state = ConnectionState::Connecting;
    }

    /// Sends `message` if the link is open; otherwise drops it silently.
    pub fn send(&mut self, message: &ClientMessage) {
        if self.state != ConnectionState::Open {
            log::debug!("Not connected, dropping {:?}", message);
            return;
        }
        let Some(link) = &mut self.link else {
            return;
        };

        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to encode outbound message: {}", e);
                return;
            }
        };

        if let Err(e) = link.send(text) {
            log::warn!("Send failed: {}", e);
        }
    }

    /// Applies one transport event. Returns the decoded message for text frames.
    pub fn handle_event(
        &mut self,
        event: TransportEvent,
        timers: &mut Scheduler<Task>,
        now: Instant,
    ) -> Option<ServerMessage> {
        if event.attempt != self.attempt || self.link.is_none() {
            log::debug!("Ignoring event from stale attempt {}", event.attempt);
            return None;
        }

        match event.kind {
            TransportEventKind::Opened => {
                log::info!("Connected to server");
                self.state = ConnectionState::Open;
                None
            }
            TransportEventKind::Text(text) => Self::decode(&text),
            TransportEventKind::Error(message) => {
                log::warn!("WebSocket error: {}", message);
                None
            }
            TransportEventKind::Closed => {
                self.handle_closed(timers, now);
                None
            }
        }
    }

    fn decode(text: &str) -> Option<ServerMessage> {
        match ServerMessage::decode(text) {
            Ok(Some(message)) => Some(message),
            Ok(None) => {
                log::trace!("Ignoring message of unknown type");
                None
            }
            Err(e) => {
                log::warn!("Dropping malformed frame: {}", e);
                None
            }
        }
    }

    fn handle_closed(&mut self, timers: &mut Scheduler<Task>, now: Instant) {
        log::info!("Disconnected from server");
        self.state = ConnectionState::Disconnected;
        // With no link, later events for this attempt are dropped in `handle_event`.
        self.link = None;

        self.reconnect = Some(timers.schedule(now, self.reconnect_delay, Task::Reconnect));
        log::info!("Reconnecting in {} ms", self.reconnect_delay.as_millis());
    }

    /// Called when a `Task::Reconnect` fires. Orphaned timers are ignored.
    pub fn on_reconnect_due(&mut self, handle: TaskHandle) {
        if self.reconnect != Some(handle) {
            return;
        }
        self.reconnect = None;
        self.connect();
    }

    pub fn shutdown(&mut self, timers: &mut Scheduler<Task>) {
        if let Some(handle) = self.reconnect.take() {
            timers.cancel(handle);
        }
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}
