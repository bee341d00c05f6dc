use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use tokio::runtime::Handle;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::net::{ConnectionState, Connector, TransportEvent};
use crate::render::{DrawList, Renderer};
use crate::session::Session;

const TITLE: &str = "Racer";

pub struct App<C: Connector> {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    session: Session<C>,
    runtime: Handle,
    frame: DrawList,
    fullscreen: bool,
    shown_status: Option<ConnectionState>,
}

impl<C: Connector> App<C> {
    pub fn new(session: Session<C>, runtime: Handle) -> Self {
        Self {
            window: None,
            renderer: None,
            session,
            runtime,
            frame: DrawList::new(),
            fullscreen: false,
            shown_status: None,
        }
    }

    fn toggle_fullscreen(&mut self) {
        let Some(window) = &self.window else { return };

        self.fullscreen = !self.fullscreen;
        window.set_fullscreen(self.fullscreen.then(|| Fullscreen::Borderless(None)));
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Keeps the window title in step with the connection status.
    fn sync_title(&mut self) {
        let status = self.session.status();
        if self.shown_status == Some(status) {
            return;
        }
        if let Some(window) = &self.window {
            window.set_title(&format!("{} - {}", TITLE, status.label()));
            self.shown_status = Some(status);
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;
        let outcome = self.session.on_key(&event.logical_key, pressed);

        if outcome.changed {
            log::trace!("Input: {:?}", event.logical_key);
        }
        if outcome.consumed {
            return;
        }

        if pressed && !event.repeat && event.logical_key == Key::Named(NamedKey::F11) {
            self.toggle_fullscreen();
        }
    }

    fn handle_resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size);
        }
        if size.width > 0 && size.height > 0 {
            self.session
                .set_viewport(Vec2::new(size.width as f32, size.height as f32));
        }
        self.request_redraw();
    }

    fn handle_redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        self.frame.clear_commands();
        self.session.draw(&mut self.frame);

        match renderer.render(&self.frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                self.session.shutdown();
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let config = self.session.config();
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_width,
                config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(attrs)?);
        let renderer = self.runtime.block_on(Renderer::new(window.clone()))?;

        self.session.set_viewport(Vec2::new(
            renderer.size.width as f32,
            renderer.size.height as f32,
        ));
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }
}

impl<C: Connector> ApplicationHandler<TransportEvent> for App<C> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("Failed to initialise window: {:#}", e);
            event_loop.exit();
            return;
        }

        self.session.start();
        self.sync_title();
        self.request_redraw();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: TransportEvent) {
        if self.session.on_transport(event, Instant::now()) {
            self.sync_title();
            self.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.handle_redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.poll_timers(Instant::now()) {
            self.sync_title();
            self.request_redraw();
        }

        event_loop.set_control_flow(match self.session.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session.shutdown();
    }
}
