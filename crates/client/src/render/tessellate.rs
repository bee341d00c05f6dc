use std::f32::consts::TAU;
use std::ops::Range;

use glam::{DVec2, Vec2};

use super::canvas::{Color, DrawCmd, LineCap, Rect, Stroke, split_layers};
use super::vertex::Vertex;

const EPSILON: f32 = 1e-4;
const MIN_ARC_SEGMENTS: usize = 12;
const MAX_ARC_SEGMENTS: usize = 96;

/// Converts recorded draw commands into a triangle list. Dashed strokes are
/// only generated inside `clip`.
///
/// `Clear`, `Layer` and `Text` commands produce no geometry; the renderer
/// handles them separately.
pub fn tessellate(commands: &[DrawCmd], clip: Rect) -> Vec<Vertex> {
    let mut out = Vec::new();

    for cmd in commands {
        match cmd {
            DrawCmd::Clear(_) | DrawCmd::Layer | DrawCmd::Text { .. } => {}
            DrawCmd::Quad { corners, color } => quad(&mut out, *corners, *color),
            DrawCmd::Polyline {
                points,
                closed,
                stroke,
            } => polyline(&mut out, points, *closed, *stroke, clip),
            DrawCmd::Ring {
                center,
                radius,
                stroke,
            } => ring(&mut out, *center, *radius, stroke.width, stroke.color),
        }
    }

    out
}

/// Tessellates each layer into one shared buffer, returning the vertex range
/// of every layer in draw order.
pub fn tessellate_layers(commands: &[DrawCmd], clip: Rect) -> (Vec<Vertex>, Vec<Range<u32>>) {
    let mut vertices = Vec::new();
    let mut ranges = Vec::new();

    for layer in split_layers(commands) {
        let start = vertices.len() as u32;
        vertices.extend(tessellate(layer, clip));
        ranges.push(start..vertices.len() as u32);
    }

    (vertices, ranges)
}

/// The most recent clear colour, if the list has one.
pub fn clear_color(commands: &[DrawCmd]) -> Option<Color> {
    commands.iter().rev().find_map(|cmd| match cmd {
        DrawCmd::Clear(color) => Some(*color),
        _ => None,
    })
}

fn arc_segments(radius: f32) -> usize {
    ((radius * 0.75).ceil() as usize).clamp(MIN_ARC_SEGMENTS, MAX_ARC_SEGMENTS)
}

fn quad(out: &mut Vec<Vertex>, [a, b, c, d]: [Vec2; 4], color: Color) {
    let [a, b, c, d] = [a, b, c, d].map(|p| Vertex::new(p, color));
    out.extend_from_slice(&[a, b, c, a, c, d]);
}

fn disc(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: Color) {
    let segments = arc_segments(radius);
    let mid = Vertex::new(center, color);
    for i in 0..segments {
        let a0 = TAU * i as f32 / segments as f32;
        let a1 = TAU * (i + 1) as f32 / segments as f32;
        out.push(mid);
        out.push(Vertex::new(center + Vec2::from_angle(a0) * radius, color));
        out.push(Vertex::new(center + Vec2::from_angle(a1) * radius, color));
    }
}

fn ring(out: &mut Vec<Vertex>, center: Vec2, radius: f32, width: f32, color: Color) {
    if !center.is_finite() || !radius.is_finite() {
        return;
    }
    let inner = (radius - width / 2.0).max(0.0);
    let outer = radius + width / 2.0;
    let segments = arc_segments(outer);

    for i in 0..segments {
        let d0 = Vec2::from_angle(TAU * i as f32 / segments as f32);
        let d1 = Vec2::from_angle(TAU * (i + 1) as f32 / segments as f32);
        quad(
            out,
            [
                center + d0 * inner,
                center + d0 * outer,
                center + d1 * outer,
                center + d1 * inner,
            ],
            color,
        );
    }
}

fn polyline(out: &mut Vec<Vertex>, points: &[Vec2], closed: bool, stroke: Stroke, clip: Rect) {
    let mut path = points.to_vec();
    if closed {
        if let Some(&first) = points.first() {
            path.push(first);
        }
    }

    match stroke.dash {
        Some((on, off)) if on > EPSILON => {
            for dash in dash_segments(&path, on, off.max(0.0), clip.inflate(stroke.width)) {
                stroke_path(out, &dash, false, stroke);
            }
        }
        _ => stroke_path(out, &path, closed, stroke),
    }
}

/// Splits `path` into the "on" runs of an `(on, off)` dash pattern, keeping
/// only the parts inside `clip`. The pattern phase carries across vertices.
///
/// Segments with a non-finite endpoint are dropped and end the current dash.
pub fn dash_segments(path: &[Vec2], on: f32, off: f32, clip: Rect) -> Vec<Vec<Vec2>> {
    let on = f64::from(on);
    let period = on + f64::from(off);
    let (min, max) = (clip.min.as_dvec2(), clip.max().as_dvec2());

    let mut dashes = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    // Distance into the pattern at the start of the segment.
    let mut phase = 0.0_f64;

    for pair in path.windows(2) {
        let (a, b) = (pair[0].as_dvec2(), pair[1].as_dvec2());
        let length = a.distance(b);
        if !length.is_finite() {
            flush(&mut current, &mut dashes);
            continue;
        }
        if length < f64::from(EPSILON) {
            continue;
        }

        let segment_phase = phase;
        phase = (phase + length).rem_euclid(period);

        let Some((t0, t1)) = clip_segment(a, b, min, max) else {
            flush(&mut current, &mut dashes);
            continue;
        };

        let dir = (b - a) / length;
        let enter = (a + (b - a) * t0).clamp(min, max);
        let exit = (a + (b - a) * t1).clamp(min, max);
        let visible = enter.distance(exit);
        let local_phase = (segment_phase + t0 * length).rem_euclid(period);
        let reaches_end = t1 >= 1.0;

        if t0 > 0.0 || local_phase >= on {
            flush(&mut current, &mut dashes);
        }

        // Dash `k` covers `[k * period - local_phase, .. + on]` from `enter`.
        let count = ((local_phase + visible) / period).floor() as u64;
        for k in 0..=count {
            let dash_start = k as f64 * period - local_phase;
            let dash_end = dash_start + on;
            let (from, to) = (dash_start.max(0.0), dash_end.min(visible));
            if to <= from {
                continue;
            }

            let point = |d: f64| (enter + dir * d).as_vec2();
            if current.is_empty() {
                current.push(point(from));
            }
            current.push(point(to));

            if dash_end > visible && reaches_end {
                continue;
            }
            flush(&mut current, &mut dashes);
        }
    }

    flush(&mut current, &mut dashes);
    dashes
}

fn flush(current: &mut Vec<Vec2>, dashes: &mut Vec<Vec<Vec2>>) {
    if current.len() >= 2 {
        dashes.push(std::mem::take(current));
    }
    current.clear();
}

/// Liang-Barsky: the parameter range of `a..b` that lies inside `min..max`.
fn clip_segment(a: DVec2, b: DVec2, min: DVec2, max: DVec2) -> Option<(f64, f64)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }

    (t0 < t1).then_some((t0, t1))
}

fn stroke_path(out: &mut Vec<Vertex>, path: &[Vec2], closed: bool, stroke: Stroke) {
    let half = stroke.width / 2.0;
    let round = stroke.cap == LineCap::Round;
    let segments: Vec<(Vec2, Vec2)> = path
        .windows(2)
        .map(|w| (w[0], w[1]))
        .filter(|(a, b)| a.is_finite() && b.is_finite() && a.distance(*b) >= EPSILON)
        .collect();
    let count = segments.len();

    for (i, &(a, b)) in segments.iter().enumerate() {
        let dir = (b - a).normalize();
        let normal = dir.perp() * half;

        // Butt strokes get square joins at interior corners.
        let extend_start = !round && (i > 0 || closed);
        let extend_end = !round && (i + 1 < count || closed);
        let a = if extend_start { a - dir * half } else { a };
        let b = if extend_end { b + dir * half } else { b };

        quad(out, [a + normal, b + normal, b - normal, a - normal], stroke.color);
    }

    if round {
        let Some(&(first, _)) = segments.first() else {
            return;
        };
        disc(out, first, half, stroke.color);
        for &(_, b) in &segments {
            disc(out, b, half, stroke.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::{Canvas, DrawList, Rect, TextStyle};

    const SCREEN: Rect = Rect::new(-1000.0, -1000.0, 2000.0, 2000.0);

    fn list(f: impl FnOnce(&mut DrawList)) -> DrawList {
        let mut list = DrawList::new();
        f(&mut list);
        list
    }

    #[test]
    fn quad_is_two_triangles() {
        let list = list(|c| c.fill_rect(Rect::new(0.0, 0.0, 10.0, 5.0), Color::WHITE));
        let verts = tessellate(list.commands(), SCREEN);
        assert_eq!(verts.len(), 6);
        assert_eq!(verts[2].position, [10.0, 5.0]);
    }

    #[test]
    fn clear_and_text_produce_no_geometry() {
        let list = list(|c| {
            c.clear(Color::hex(0x228B22));
            c.fill_text("hi", Vec2::ZERO, TextStyle::bold(12.0, Color::WHITE));
        });
        assert!(tessellate(list.commands(), SCREEN).is_empty());
        assert_eq!(clear_color(list.commands()), Some(Color::hex(0x228B22)));
    }

    #[test]
    fn butt_segment_has_exact_width() {
        let list = list(|c| {
            c.stroke_polyline(
                &[Vec2::ZERO, Vec2::new(100.0, 0.0)],
                Stroke::solid(Color::WHITE, 4.0),
            )
        });
        let verts = tessellate(list.commands(), SCREEN);
        assert_eq!(verts.len(), 6);

        let ys: Vec<f32> = verts.iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| (y.abs() - 2.0).abs() < 1e-5));
        let max_x = verts.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 100.0);
    }

    #[test]
    fn round_caps_add_discs() {
        let butt = list(|c| {
            c.stroke_polyline(
                &[Vec2::ZERO, Vec2::new(50.0, 0.0)],
                Stroke::solid(Color::WHITE, 10.0),
            )
        });
        let round = list(|c| {
            c.stroke_polyline(
                &[Vec2::ZERO, Vec2::new(50.0, 0.0)],
                Stroke::solid(Color::WHITE, 10.0).round(),
            )
        });

        let extra = tessellate(round.commands(), SCREEN).len() - tessellate(butt.commands(), SCREEN).len();
        assert_eq!(extra, 2 * 3 * arc_segments(5.0));
    }

    #[test]
    fn dashes_follow_pattern_across_vertices() {
        let dashes = dash_segments(&[Vec2::ZERO, Vec2::new(100.0, 0.0)], 20.0, 20.0, SCREEN);
        assert_eq!(dashes.len(), 3);
        assert_eq!(dashes[1], vec![Vec2::new(40.0, 0.0), Vec2::new(60.0, 0.0)]);

        let bent = dash_segments(
            &[Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(30.0, 30.0)],
            20.0,
            20.0,
            SCREEN,
        );
        assert_eq!(bent.len(), 2);
        assert_eq!(bent[0], vec![Vec2::ZERO, Vec2::new(20.0, 0.0)]);
        assert_eq!(
            bent[1],
            vec![
                Vec2::new(30.0, 10.0),
                Vec2::new(30.0, 30.0)
            ]
        );
    }

    #[test]
    fn ring_spans_stroke_width() {
        let list = list(|c| {
            c.stroke_circle(Vec2::new(10.0, 10.0), 50.0, Stroke::solid(Color::WHITE, 4.0))
        });
        let verts = tessellate(list.commands(), SCREEN);
        assert_eq!(verts.len(), 6 * arc_segments(52.0));

        for v in &verts {
            let d = Vec2::from(v.position).distance(Vec2::new(10.0, 10.0));
            assert!((48.0 - 1e-3..=52.0 + 1e-3).contains(&d), "{d}");
        }
    }

    #[test]
    fn degenerate_segments_are_skipped() {
        let list = list(|c| {
            c.stroke_polyline(&[Vec2::ONE, Vec2::ONE], Stroke::solid(Color::WHITE, 3.0).round())
        });
        assert!(tessellate(list.commands(), SCREEN).is_empty());
    }

    #[test]
    fn dashes_stop_at_non_finite_points() {
        let dashes = dash_segments(
            &[
                Vec2::ZERO,
                Vec2::new(100.0, 0.0),
                Vec2::new(f32::INFINITY, 0.0),
                Vec2::new(f32::NAN, 5.0),
            ],
            20.0,
            20.0,
            SCREEN,
        );
        assert_eq!(dashes.len(), 3);
        assert!(dashes.iter().flatten().all(|p| p.is_finite()));

        let list = list(|c| {
            c.stroke_polyline(
                &[Vec2::ZERO, Vec2::new(f32::INFINITY, f32::NEG_INFINITY)],
                Stroke::solid(Color::WHITE, 3.0).round().dashed(20.0, 20.0),
            )
        });
        assert!(tessellate(list.commands(), SCREEN).is_empty());
    }

    #[test]
    fn very_long_dashed_segment_is_clipped() {
        let view = Rect::new(0.0, -10.0, 100.0, 20.0);
        let dashes = dash_segments(&[Vec2::ZERO, Vec2::new(1e30, 0.0)], 20.0, 20.0, view);

        assert_eq!(dashes.len(), 3);
        assert_eq!(dashes[0][0], Vec2::ZERO);
        for p in dashes.iter().flatten() {
            assert!((0.0..=100.001).contains(&p.x), "{p}");
        }

        let off_screen = dash_segments(
            &[Vec2::new(-1e30, 500.0), Vec2::new(1e30, 500.0)],
            20.0,
            20.0,
            view,
        );
        assert!(off_screen.is_empty());
    }

    #[test]
    fn dash_phase_survives_clipping() {
        let view = Rect::new(50.0, -10.0, 100.0, 20.0);
        let dashes = dash_segments(&[Vec2::ZERO, Vec2::new(200.0, 0.0)], 20.0, 20.0, view);

        let starts: Vec<f32> = dashes.iter().map(|d| d[0].x).collect();
        assert_eq!(starts, vec![50.0, 80.0, 120.0]);
        assert_eq!(dashes[0][1].x, 60.0);
        assert_eq!(dashes[2][1].x, 140.0);
    }

    #[test]
    fn layers_keep_world_geometry_before_ui() {
        let list = list(|c| {
            c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
            c.fill_text("world", Vec2::ZERO, TextStyle::bold(12.0, Color::WHITE));
            c.new_layer();
            c.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::BLACK);
            c.fill_rect(Rect::new(5.0, 5.0, 5.0, 5.0), Color::BLACK);
        });
        let (vertices, ranges) = tessellate_layers(list.commands(), SCREEN);

        assert_eq!(ranges, vec![0..6, 6..18]);
        assert_eq!(vertices.len(), 18);
        assert_eq!(vertices[0].color, Color::WHITE.to_linear());
        assert_eq!(vertices[6].color, Color::BLACK.to_linear());
    }
}
