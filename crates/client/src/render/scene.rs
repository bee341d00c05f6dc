use glam::Vec2;
use racer::{Player, Snapshot};

use crate::net::ConnectionState;

use super::canvas::{Canvas, Color, Rect, Stroke, TextStyle};

const BACKGROUND: Color = Color::hex(0x228B22);

/// The track polyline always starts here, before the first checkpoint.
const TRACK_ORIGIN: Vec2 = Vec2::new(50.0, 300.0);
const TRACK_WIDTH: f32 = 120.0;
const TRACK_COLOR: Color = Color::hex(0x555555);
const CENTERLINE_WIDTH: f32 = 3.0;
const CENTERLINE_DASH: (f32, f32) = (20.0, 20.0);

const GOLD: Color = Color::hex(0xFFD700);
const CHECKPOINT_COLOR: Color = Color::hex(0x00FF00);
const CHECKPOINT_RING_WIDTH: f32 = 3.0;

const PLAYER_COLORS: [Color; 2] = [Color::hex(0xFF6B6B), Color::hex(0x4ECDC4)];
const CAR_BODY: Rect = Rect::new(-20.0, -12.0, 40.0, 24.0);
const CAR_WINDSHIELD: Rect = Rect::new(5.0, -8.0, 10.0, 16.0);
const CAR_WHEELS: [Rect; 4] = [
    Rect::new(-15.0, -12.0, 8.0, 4.0),
    Rect::new(-15.0, 8.0, 8.0, 4.0),
    Rect::new(7.0, -12.0, 8.0, 4.0),
    Rect::new(7.0, 8.0, 8.0, 4.0),
];
const PLAYER_LABEL_RISE: f32 = 30.0;

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 30.0;
const BAR_SPACING: f32 = 10.0;
const BAR_PADDING: f32 = 20.0;
const BAR_BACKGROUND: Color = Color::hex(0x333333);

pub fn player_color(index: usize) -> Color {
    PLAYER_COLORS[index % PLAYER_COLORS.len()]
}

/// Draws one complete frame for `snapshot` as seen through the camera `offset`.
pub fn draw_frame(canvas: &mut impl Canvas, snapshot: Option<&Snapshot>, offset: Vec2) {
    canvas.clear(BACKGROUND);

    let Some(snapshot) = snapshot else {
        return;
    };

    canvas.save();
    canvas.translate(offset);

    draw_track(canvas, snapshot);
    draw_checkpoints(canvas, snapshot);
    for (index, player) in snapshot.players.iter().enumerate() {
        draw_player(canvas, snapshot, player, index);
    }

    canvas.restore();

    canvas.new_layer();
    draw_progress_bars(canvas, snapshot);
}

fn track_path(snapshot: &Snapshot) -> Vec<Vec2> {
    std::iter::once(TRACK_ORIGIN)
        .chain(snapshot.checkpoints.iter().map(|cp| cp.position()))
        .collect()
}

fn draw_track(canvas: &mut impl Canvas, snapshot: &Snapshot) {
    if snapshot.checkpoints.is_empty() {
        return;
    }

    let path = track_path(snapshot);
    canvas.stroke_polyline(&path, Stroke::solid(TRACK_COLOR, TRACK_WIDTH).round());

    let (on, off) = CENTERLINE_DASH;
    canvas.stroke_polyline(
        &path,
        Stroke::solid(GOLD, CENTERLINE_WIDTH).round().dashed(on, off),
    );
}

fn draw_checkpoints(canvas: &mut impl Canvas, snapshot: &Snapshot) {
    let last = snapshot.checkpoints.len().saturating_sub(1);
    let label_style = TextStyle::bold(20.0, Color::WHITE);

    for (index, cp) in snapshot.checkpoints.iter().enumerate() {
        let is_finish = index == last;
        let color = if is_finish { GOLD } else { CHECKPOINT_COLOR };

        canvas.stroke_circle(
            cp.position(),
            cp.radius,
            Stroke::solid(color, CHECKPOINT_RING_WIDTH),
        );

        let label = if is_finish {
            "FINISH".to_owned()
        } else {
            (index + 1).to_string()
        };
        canvas.fill_text(&label, cp.position(), label_style);
    }
}

fn draw_player(canvas: &mut impl Canvas, snapshot: &Snapshot, player: &Player, index: usize) {
    canvas.save();
    canvas.translate(player.position());
    canvas.rotate(player.angle.to_radians());

    canvas.fill_rect(CAR_BODY, player_color(index));
    canvas.stroke_rect(CAR_BODY, Stroke::solid(Color::BLACK, 2.0));
    canvas.fill_rect(CAR_WINDSHIELD, Color::WHITE.with_alpha(0.5));
    for wheel in CAR_WHEELS {
        canvas.fill_rect(wheel, Color::BLACK);
    }

    canvas.restore();

    let label = format!(
        "P{} ({}/{})",
        player.id,
        player.checkpoint,
        snapshot.total_checkpoints()
    );
    canvas.fill_text(
        &label,
        player.position() - Vec2::new(0.0, PLAYER_LABEL_RISE),
        TextStyle::bold(16.0, Color::BLACK),
    );
}

fn draw_progress_bars(canvas: &mut impl Canvas, snapshot: &Snapshot) {
    for (index, player) in snapshot.players.iter().enumerate() {
        let y = BAR_PADDING + index as f32 * (BAR_HEIGHT + BAR_SPACING);
        let frame = Rect::new(BAR_PADDING, y, BAR_WIDTH, BAR_HEIGHT);

        canvas.fill_rect(frame, BAR_BACKGROUND);

        let fill = BAR_WIDTH * snapshot.progress(player);
        canvas.fill_rect(
            Rect::new(BAR_PADDING, y, fill, BAR_HEIGHT),
            player_color(index),
        );

        canvas.stroke_rect(frame, Stroke::solid(Color::WHITE, 2.0));

        let label = format!(
            "Player {}: {}/{}",
            player.id,
            player.checkpoint,
            snapshot.total_checkpoints()
        );
        canvas.fill_text(
            &label,
            Vec2::new(BAR_PADDING + BAR_WIDTH / 2.0, y + BAR_HEIGHT / 2.0),
            TextStyle::bold(14.0, Color::WHITE),
        );
    }
}

/// Screen-space status regions drawn on top of every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub status: ConnectionState,
    pub snapshot_rate: f32,
    pub winner: Option<String>,
}

pub fn draw_hud(canvas: &mut impl Canvas, hud: &Hud, viewport: Vec2) {
    canvas.new_layer();

    let status_color = match hud.status {
        ConnectionState::Open => Color::hex(0x7CFC00),
        ConnectionState::Connecting => GOLD,
        ConnectionState::Disconnected => Color::hex(0xFF4040),
    };
    let right = viewport.x - 150.0;
    canvas.fill_text(
        hud.status.label(),
        Vec2::new(right, 20.0),
        TextStyle::bold(16.0, status_color),
    );
    canvas.fill_text(
        &format!("Snapshots: {:.1}/s", hud.snapshot_rate),
        Vec2::new(right, 42.0),
        TextStyle {
            size: 13.0,
            color: Color::WHITE,
            bold: false,
        },
    );

    if let Some(headline) = &hud.winner {
        let center = viewport * 0.5;
        let panel = Vec2::new(460.0, 180.0);
        canvas.fill_rect(
            Rect::new(center.x - panel.x / 2.0, center.y - panel.y / 2.0, panel.x, panel.y),
            Color::BLACK.with_alpha(0.75),
        );
        canvas.fill_text(
            headline,
            center - Vec2::new(0.0, 25.0),
            TextStyle::bold(44.0, GOLD),
        );
        canvas.fill_text(
            "Congratulations!",
            center + Vec2::new(0.0, 40.0),
            TextStyle::bold(26.0, Color::WHITE),
        );
    }
}
