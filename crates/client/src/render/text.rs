use glyphon::{
    Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer, Viewport, Weight,
};

use super::canvas::{DrawCmd, TextStyle, split_layers};

const LINE_HEIGHT: f32 = 1.25;

struct Label {
    layer: usize,
    text: String,
    style: TextStyle,
    left: f32,
    top: f32,
    buffer: Buffer,
}

/// Glyphs for the `Text` commands of a draw list. Labels are centred on their
/// anchor. Each draw list layer gets its own renderer so its text can be drawn
/// right after that layer's geometry; all of them share one atlas.
pub struct TextLayer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    atlas: TextAtlas,
    renderers: Vec<TextRenderer>,
    multisample: wgpu::MultisampleState,
    viewport: Viewport,
    labels: Vec<Label>,
    layers: usize,
    width: u32,
    height: u32,
}

impl TextLayer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let cache = Cache::new(device);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let multisample = wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        };
        let renderers = vec![TextRenderer::new(&mut atlas, device, multisample, None)];
        let mut viewport = Viewport::new(device, &cache);
        viewport.update(queue, Resolution { width, height });

        Self {
            font_system,
            swash_cache,
            atlas,
            renderers,
            multisample,
            viewport,
            labels: Vec::new(),
            layers: 1,
            width,
            height,
        }
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.viewport.update(queue, Resolution { width, height });
    }

    /// Lays out every `Text` command, remembering which layer it belongs to.
    /// Buffers are reused while a label's text and style stay the same.
    pub fn update(&mut self, commands: &[DrawCmd]) {
        let layers = split_layers(commands);
        self.layers = layers.len();
        let mut index = 0;

        for (layer, layer_commands) in layers.into_iter().enumerate() {
            for cmd in layer_commands {
                let DrawCmd::Text {
                    text,
                    position,
                    style,
                } = cmd
                else {
                    continue;
                };
                if !position.is_finite() {
                    continue;
                }

                let reusable = self
                    .labels
                    .get(index)
                    .is_some_and(|l| l.text == *text && l.style == *style);

                if !reusable {
                    let buffer = self.shape(text, style);
                    let label = Label {
                        layer,
                        text: text.clone(),
                        style: *style,
                        left: 0.0,
                        top: 0.0,
                        buffer,
                    };
                    if index < self.labels.len() {
                        self.labels[index] = label;
                    } else {
                        self.labels.push(label);
                    }
                }

                let label = &mut self.labels[index];
                let (w, h) = measure(&label.buffer);
                label.layer = layer;
                label.left = position.x - w / 2.0;
                label.top = position.y - h / 2.0;
                index += 1;
            }
        }

        self.labels.truncate(index);
    }

    fn shape(&mut self, text: &str, style: &TextStyle) -> Buffer {
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics::new(style.size, style.size * LINE_HEIGHT),
        );
        buffer.set_size(&mut self.font_system, None, None);

        let weight = if style.bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        };
        buffer.set_text(
            &mut self.font_system,
            text,
            &Attrs::new().family(Family::SansSerif).weight(weight),
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<(), glyphon::PrepareError> {
        while self.renderers.len() < self.layers {
            let renderer = TextRenderer::new(&mut self.atlas, device, self.multisample, None);
            self.renderers.push(renderer);
        }

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        };

        for (layer, renderer) in self.renderers.iter_mut().enumerate() {
            let text_areas = self
                .labels
                .iter()
                .filter(|label| label.layer == layer)
                .map(|label| {
                    let [r, g, b, a] = label.style.color.to_rgba8();
                    TextArea {
                        buffer: &label.buffer,
                        left: label.left,
                        top: label.top,
                        scale: 1.0,
                        bounds,
                        default_color: Color::rgba(r, g, b, a),
                        custom_glyphs: &[],
                    }
                });

            renderer.prepare(
                device,
                queue,
                &mut self.font_system,
                &mut self.atlas,
                &self.viewport,
                text_areas,
                &mut self.swash_cache,
            )?;
        }

        Ok(())
    }

    /// Draws the labels of `layer` into a pass using the same sample count
    /// this layer was created with.
    pub fn render<'a>(
        &'a self,
        layer: usize,
        pass: &mut wgpu::RenderPass<'a>,
    ) -> Result<(), glyphon::RenderError> {
        match self.renderers.get(layer) {
            Some(renderer) => renderer.render(&self.atlas, &self.viewport, pass),
            None => Ok(()),
        }
    }

    pub fn trim(&mut self) {
        self.atlas.trim();
    }
}

fn measure(buffer: &Buffer) -> (f32, f32) {
    let line_height = buffer.metrics().line_height;
    buffer
        .layout_runs()
        .fold((0.0_f32, 0.0_f32), |(w, h), run| (w.max(run.line_w), h + line_height))
}
