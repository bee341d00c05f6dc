use std::time::Instant;

use glam::Vec2;
use racer::{ServerMessage, Snapshot};
use winit::keyboard::Key;

use crate::debug::SnapshotStats;
use crate::game::{InputTracker, KeyOutcome, StateStore, WinnerOverlay};
use crate::net::{ClientConfig, ConnectionManager, ConnectionState, Connector, TransportEvent};
use crate::render::{CameraController, Canvas, Hud, draw_frame, draw_hud};
use crate::timer::Scheduler;

/// Deferred work owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Reconnect,
    Reload,
}

/// Everything one race session needs, driven from the window thread.
pub struct Session<C: Connector> {
    config: ClientConfig,
    connection: ConnectionManager<C>,
    input: InputTracker,
    store: StateStore,
    camera: CameraController,
    winner: WinnerOverlay,
    timers: Scheduler<Task>,
    stats: SnapshotStats,
}

impl<C: Connector> Session<C> {
    pub fn new(config: ClientConfig, connector: C) -> Self {
        let connection =
            ConnectionManager::new(connector, config.endpoint(), config.reconnect_delay);
        let viewport = Vec2::new(config.window_width as f32, config.window_height as f32);

        Self {
            connection,
            input: InputTracker::default(),
            store: StateStore::default(),
            camera: CameraController::new(viewport, config.camera_smoothing),
            winner: WinnerOverlay::new(config.reset_delay),
            timers: Scheduler::new(),
            stats: SnapshotStats::new(),
            config,
        }
    }

    pub fn start(&mut self) {
        self.connection.connect();
    }

    /// Applies a transport event. Returns true if the frame needs redrawing.
    pub fn on_transport(&mut self, event: TransportEvent, now: Instant) -> bool {
        let before = self.connection.state();

        let redraw = match self.connection.handle_event(event, &mut self.timers, now) {
            Some(ServerMessage::Connected(info)) => {
                log::info!(
                    "Server acknowledged connection (player {}, room {}, mode {})",
                    info.player_id.as_ref().map_or("-", |id| id.as_str()),
                    info.room_id.as_deref().unwrap_or("-"),
                    info.mode.as_deref().unwrap_or("-"),
                );
                false
            }
            Some(ServerMessage::GameState(snapshot)) => {
                self.apply_snapshot(snapshot, now);
                true
            }
            None => false,
        };

        redraw || self.connection.state() != before
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot, now: Instant) {
        self.stats.record_snapshot(now);

        let snapshot = self.store.replace(snapshot);
        log::trace!(
            "Snapshot: {} players, {} checkpoints",
            snapshot.players.len(),
            snapshot.checkpoints.len()
        );

        self.camera.update(snapshot);

        if let Some(winner) = &snapshot.winner {
            self.winner.show(winner, &mut self.timers, now);
        }
    }

    /// Feeds a key transition to the input tracker, sending the full input
    /// state whenever it changes.
    pub fn on_key(&mut self, key: &Key, pressed: bool) -> KeyOutcome {
        let outcome = self.input.handle_key(key, pressed);
        if outcome.changed {
            self.connection.send(&self.input.message());
        }
        outcome
    }

    /// Runs every task due at `now`. Returns true if any ran.
    pub fn poll_timers(&mut self, now: Instant) -> bool {
        let due = self.timers.take_due(now);
        let fired = !due.is_empty();

        for (handle, task) in due {
            match task {
                Task::Reconnect => self.connection.on_reconnect_due(handle),
                Task::Reload => {
                    if self.winner.is_reload(handle) {
                        self.reload();
                    }
                }
            }
        }

        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Returns the session to its initial state and reconnects.
    pub fn reload(&mut self) {
        log::info!("Reloading session");

        self.connection.shutdown(&mut self.timers);
        self.timers.cancel_all();
        self.input.reset();
        self.store.clear();
        self.camera.reset();
        self.winner = WinnerOverlay::new(self.config.reset_delay);
        self.stats.reset();

        self.connection.connect();
    }

    pub fn shutdown(&mut self) {
        self.winner.cancel(&mut self.timers);
        self.connection.shutdown(&mut self.timers);
        self.timers.cancel_all();
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.camera.set_viewport(viewport);
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        draw_frame(canvas, self.store.current(), self.camera.offset());
        draw_hud(canvas, &self.hud(), self.camera.viewport());
    }

    pub fn hud(&self) -> Hud {
        Hud {
            status: self.connection.state(),
            snapshot_rate: self.stats.rate(),
            winner: self.winner.headline(),
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.store.current()
    }

    pub fn camera_offset(&self) -> Vec2 {
        self.camera.offset()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use racer::PlayerId;
    use winit::keyboard::NamedKey;

    use crate::net::TransportEventKind;
    use crate::net::connection::testing::FakeConnector;
    use crate::render::{DrawCmd, DrawList};

    const RESET: Duration = Duration::from_millis(5000);

    fn session() -> (Session<FakeConnector>, FakeConnector) {
        let connector = FakeConnector::default();
        let mut session = Session::new(ClientConfig::default(), connector.clone());
        session.start();
        (session, connector)
    }

    fn deliver(session: &mut Session<FakeConnector>, kind: TransportEventKind, now: Instant) -> bool {
        let event = TransportEvent::new(session.connection.attempt(), kind);
        session.on_transport(event, now)
    }

    fn game_state(winner: &str) -> TransportEventKind {
        TransportEventKind::Text(format!(
            r#"{{"type":"gameState",
                "players":[{{"id":"1","x":100,"y":200,"angle":0,"checkpoint":5}},
                           {{"id":"2","x":300,"y":400,"angle":90,"checkpoint":3}}],
                "checkpoints":[{{"x":200,"y":300,"radius":50}}],
                "winner":"{winner}"}}"#
        ))
    }

    #[test]
    fn opening_redraws_and_updates_status() {
        let (mut session, _) = session();
        assert_eq!(session.status(), ConnectionState::Connecting);

        assert!(deliver(&mut session, TransportEventKind::Opened, Instant::now()));
        assert_eq!(session.status(), ConnectionState::Open);
    }

    #[test]
    fn snapshot_replaces_state_and_moves_camera() {
        let (mut session, _) = session();
        let now = Instant::now();
        deliver(&mut session, TransportEventKind::Opened, now);

        assert!(deliver(&mut session, game_state(""), now));

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.players.len(), 2);
        assert!(snapshot.winner.is_none());
        assert_ne!(session.camera_offset(), Vec2::ZERO);
        assert!(session.hud().winner.is_none());
    }

    #[test]
    fn connected_ack_does_not_touch_state() {
        let (mut session, _) = session();
        let now = Instant::now();
        deliver(&mut session, TransportEventKind::Opened, now);

        let ack = TransportEventKind::Text(r#"{"type":"connected","playerId":"1"}"#.into());
        assert!(!deliver(&mut session, ack, now));
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn input_changes_are_sent_only_when_open() {
        let (mut session, connector) = session();
        let w = Key::Character("w".into());

        assert!(session.on_key(&w, true).changed);
        assert!(connector.wire.borrow().sent.is_empty());

        deliver(&mut session, TransportEventKind::Opened, Instant::now());
        session.on_key(&w, false);
        session.on_key(&Key::Named(NamedKey::ArrowLeft), true);
        session.on_key(&Key::Named(NamedKey::ArrowLeft), true);

        let wire = connector.wire.borrow();
        assert_eq!(wire.sent.len(), 2);
        let last: serde_json::Value = serde_json::from_str(&wire.sent[1].1).unwrap();
        assert_eq!(last["type"], "input");
        assert_eq!(last["input"]["left"].as_bool(), Some(true));
        assert_eq!(last["input"]["w"].as_bool(), Some(false));
    }

    #[test]
    fn winner_shows_once_and_reloads_after_delay() {
        let (mut session, connector) = session();
        let start = Instant::now();
        deliver(&mut session, TransportEventKind::Opened, start);

        deliver(&mut session, game_state("1"), start);
        assert_eq!(session.hud().winner.as_deref(), Some("Player 1 Wins!"));
        assert_eq!(session.next_deadline(), Some(start + RESET));

        // Later winner snapshots change nothing.
        deliver(&mut session, game_state("1"), start + Duration::from_millis(50));
        assert_eq!(session.timers.len(), 1);
        assert_eq!(session.winner.winner(), Some(&PlayerId::new("1")));

        assert!(!session.poll_timers(start + RESET - Duration::from_millis(1)));
        assert!(session.snapshot().is_some());

        assert!(session.poll_timers(start + RESET));
        assert!(session.snapshot().is_none());
        assert!(session.hud().winner.is_none());
        assert_eq!(session.camera_offset(), Vec2::ZERO);
        assert_eq!(session.status(), ConnectionState::Connecting);

        let wire = connector.wire.borrow();
        assert_eq!(wire.opened.len(), 2);
        assert_eq!(wire.closed, vec![wire.opened[0]]);
    }

    #[test]
    fn reload_discards_pending_reconnect() {
        let (mut session, connector) = session();
        let now = Instant::now();
        deliver(&mut session, TransportEventKind::Closed, now);
        assert_eq!(session.timers.len(), 1);

        session.reload();
        assert!(session.timers.is_empty());
        assert!(!session.poll_timers(now + Duration::from_secs(10)));
        assert_eq!(connector.wire.borrow().opened.len(), 2);
    }

    #[test]
    fn close_after_reload_attempt_is_ignored() {
        let (mut session, _) = session();
        let now = Instant::now();
        let stale = TransportEvent::new(session.connection.attempt(), TransportEventKind::Closed);

        session.reload();
        assert!(!session.on_transport(stale, now));
        assert_eq!(session.status(), ConnectionState::Connecting);
        assert!(session.timers.is_empty());
    }

    #[test]
    fn draw_without_snapshot_is_background_and_hud() {
        let (session, _) = session();
        let mut list = DrawList::new();
        session.draw(&mut list);

        assert!(matches!(list.commands()[0], DrawCmd::Clear(_)));
        assert!(list.commands().iter().any(|c| matches!(
            c,
            DrawCmd::Text { text, .. } if text == "Connecting..."
        )));
        assert!(
            !list
                .commands()
                .iter()
                .any(|c| matches!(c, DrawCmd::Quad { .. } | DrawCmd::Polyline { .. }))
        );
    }

    #[test]
    fn shutdown_cancels_everything() {
        let (mut session, connector) = session();
        let now = Instant::now();
        deliver(&mut session, TransportEventKind::Opened, now);
        deliver(&mut session, game_state("2"), now);

        session.shutdown();
        assert!(session.next_deadline().is_none());
        assert_eq!(session.status(), ConnectionState::Disconnected);
        assert_eq!(connector.wire.borrow().closed.len(), 1);
    }
}
