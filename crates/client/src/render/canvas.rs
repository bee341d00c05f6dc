use glam::{Affine2, Vec2};

/// sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::hex(0xFFFFFF);
    pub const BLACK: Color = Color::hex(0x000000);

    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as f32 / 255.0,
            g: ((rgb >> 8) & 0xFF) as f32 / 255.0,
            b: (rgb & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_linear(self) -> [f32; 4] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b), self.a]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Grows the rect by `by` on every side.
    pub fn inflate(&self, by: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(by),
            size: self.size + Vec2::splat(2.0 * by),
        }
    }

    /// Corners in winding order, starting at `min`.
    pub fn corners(&self) -> [Vec2; 4] {
        let max = self.min + self.size;
        [
            self.min,
            Vec2::new(max.x, self.min.y),
            max,
            Vec2::new(self.min.x, max.y),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
    /// `(on, off)` dash lengths.
    pub dash: Option<(f32, f32)>,
}

impl Stroke {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            cap: LineCap::Butt,
            dash: None,
        }
    }

    pub fn round(self) -> Self {
        Self {
            cap: LineCap::Round,
            ..self
        }
    }

    pub fn dashed(self, on: f32, off: f32) -> Self {
        Self {
            dash: Some((on, off)),
            ..self
        }
    }
}

/// Text is always anchored at its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub bold: bool,
}

impl TextStyle {
    pub fn bold(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            bold: true,
        }
    }
}

/// A small immediate-mode 2D drawing surface with a save/restore transform stack.
pub trait Canvas {
    fn clear(&mut self, color: Color);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, radians: f32);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);
    fn stroke_polyline(&mut self, points: &[Vec2], stroke: Stroke);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke);
    fn fill_text(&mut self, text: &str, at: Vec2, style: TextStyle);
    /// Everything drawn after this call, text included, covers everything before it.
    fn new_layer(&mut self);
}

/// A recorded draw operation, already in screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Color),
    Layer,
    Quad {
        corners: [Vec2; 4],
        color: Color,
    },
    Polyline {
        points: Vec<Vec2>,
        closed: bool,
        stroke: Stroke,
    },
    Ring {
        center: Vec2,
        radius: f32,
        stroke: Stroke,
    },
    Text {
        text: String,
        position: Vec2,
        style: TextStyle,
    },
}

/// Records canvas calls; the GPU backend consumes the resulting list.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCmd>,
    transform: Affine2,
    stack: Vec<Affine2>,
}

impl DrawList {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            transform: Affine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.transform = Affine2::IDENTITY;
        self.stack.clear();
    }

    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    fn point(&self, p: Vec2) -> Vec2 {
        self.transform.transform_point2(p)
    }
}

impl Canvas for DrawList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCmd::Clear(color));
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.transform = self.transform * Affine2::from_translation(offset);
    }

    fn rotate(&mut self, radians: f32) {
        self.transform = self.transform * Affine2::from_angle(radians);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let corners = rect.corners().map(|c| self.point(c));
        self.commands.push(DrawCmd::Quad { corners, color });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        let points = rect.corners().iter().map(|&c| self.point(c)).collect();
        self.commands.push(DrawCmd::Polyline {
            points,
            closed: true,
            stroke,
        });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        let points = points.iter().map(|&p| self.point(p)).collect();
        self.commands.push(DrawCmd::Polyline {
            points,
            closed: false,
            stroke,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke) {
        self.commands.push(DrawCmd::Ring {
            center: self.point(center),
            radius,
            stroke,
        });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, style: TextStyle) {
        self.commands.push(DrawCmd::Text {
            text: text.to_owned(),
            position: self.point(at),
            style,
        });
    }

    fn new_layer(&mut self) {
        self.commands.push(DrawCmd::Layer);
    }
}

/// Splits recorded commands at their layer markers.
pub fn split_layers(commands: &[DrawCmd]) -> Vec<&[DrawCmd]> {
    commands
        .split(|cmd| matches!(cmd, DrawCmd::Layer))
        .collect()
}
