//! Window and main loop via winit.
//!
//! [`App`] implements [`ApplicationHandler`]. Everything GPU-backed is
//! created in `resumed`, once a window exists. Each `RedrawRequested`:
//!
//! ```text
//! tick time ─► shader reloads ─► Scene::update ─► DeferredRenderer::render
//!     │                                                    │
//!     └── title stats (once per second)        surface errors handled here
//! ```
//!
//! Keys: W/A/S/D/Space/X move, mouse looks, `R` restarts the emitters,
//! `F1` toggles light icons, `Escape` quits.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::asset::ShaderWatcher;
use crate::config::KilnConfig;
use crate::error::{KilnError, Result};
use crate::input::{CameraInput, Input, MouseMotion};
use crate::render::deferred::DeferredRenderer;
use crate::render::frame::FrameStats;
use crate::render::gpu::GpuContext;
use crate::scene::Scene;
use crate::time::{FrameRate, Time};

/// Open a window and run until it closes. Returns the error that stopped
/// the app, if any.
pub fn run(config: KilnConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Everything that needs a window.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: DeferredRenderer,
    scene: Scene,
}

pub struct App {
    config: KilnConfig,
    running: Option<Running>,
    keys: Input<KeyCode>,
    mouse: MouseMotion,
    time: Time,
    show_icons: bool,
    watcher: Option<ShaderWatcher>,
    last_stats: FrameStats,
    #[cfg(feature = "diagnostics")]
    diag: Option<crate::diag::DiagSender>,
    fatal: Option<KilnError>,
}

impl App {
    pub fn new(config: KilnConfig) -> Self {
        Self {
            show_icons: config.render.show_icons,
            config,
            running: None,
            keys: Input::new(),
            mouse: MouseMotion::default(),
            time: Time::new(),
            watcher: None,
            last_stats: FrameStats::default(),
            #[cfg(feature = "diagnostics")]
            diag: None,
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let window_config = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(&window_config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let gpu = GpuContext::new(window.clone(), window_config.vsync)?;
        let mut renderer = DeferredRenderer::new(&gpu, &self.config.render);
        let scene = Scene::build(&self.config, gpu.aspect(), &mut renderer.assets(&gpu));
        renderer.upload_materials(&gpu, &scene.materials);
        log::info!("{} meshes loaded", renderer.mesh_count());

        if self.config.render.hot_reload_shaders {
            let mut watcher = ShaderWatcher::new();
            watcher.watch_sources();
            self.watcher = Some(watcher);
        }
        #[cfg(feature = "diagnostics")]
        {
            self.diag = crate::diag::DiagSender::new(&self.config.diagnostics);
        }

        Ok(Running {
            window,
            gpu,
            renderer,
            scene,
        })
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => {
                log::info!("Escape pressed, exiting.");
                event_loop.exit();
            }
            KeyCode::KeyR => {
                if let Some(running) = &mut self.running {
                    running.scene.reset_emitters();
                }
            }
            KeyCode::F1 => {
                self.show_icons = !self.show_icons;
                log::info!("Light icons {}", if self.show_icons { "shown" } else { "hidden" });
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };
        let rate = self.time.tick();

        if let Some(watcher) = &mut self.watcher {
            for (path, kind) in watcher.poll() {
                let result = std::fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|source| running.renderer.reload_shader(&running.gpu, kind, &source));
                watcher.record(self.time.elapsed_secs(), &path, kind, result);
            }
            let events = watcher.drain_events();
            #[cfg(feature = "diagnostics")]
            if let Some(diag) = &mut self.diag {
                diag.queue_reloads(events);
            }
            #[cfg(not(feature = "diagnostics"))]
            drop(events);
        }

        let input = CameraInput::from_keys(&self.keys, self.mouse.take_delta());
        running.scene.update(self.time.delta_secs(), &input);

        match running.renderer.render(&running.gpu, &mut running.scene, self.show_icons) {
            Ok(stats) => self.last_stats = stats,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                running.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory!");
                self.fatal = Some(KilnError::OutOfMemory);
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Surface error, skipping frame: {e:?}"),
        }

        if let Some(rate) = rate {
            let title = stats_title(&self.config.window.title, rate, running.scene.living_particles());
            running.window.set_title(&title);
        }

        self.keys.clear_just();
        running.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.fatal.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                log::error!("Startup failed: {e}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(running) = &mut self.running {
                    running.gpu.resize(size.width, size.height);
                    running.renderer.resize(&running.gpu);
                    running.scene.resize(size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys.press(key);
                            if !event.repeat {
                                self.on_key(event_loop, key);
                            }
                        }
                        ElementState::Released => self.keys.release(key),
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.cursor_moved(glam::Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.mouse.cursor_left(),

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        #[cfg(feature = "diagnostics")]
        if let (Some(diag), Some(running)) = (&mut self.diag, &self.running) {
            diag.maybe_send(&self.time, &running.scene, &self.last_stats);
        }
    }
}

/// Window title with the latest frame rate and particle count.
fn stats_title(base: &str, rate: FrameRate, living_particles: usize) -> String {
    format!(
        "{base} | {:.0} fps | {:.2} ms | {living_particles} particles",
        rate.fps, rate.frame_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_shows_rate_and_particles() {
        let rate = FrameRate {
            fps: 59.7,
            frame_ms: 16.75,
        };
        assert_eq!(stats_title("kiln", rate, 120), "kiln | 60 fps | 16.75 ms | 120 particles");
    }

    #[test]
    fn icons_start_as_configured() {
        let mut config = KilnConfig::default();
        config.render.show_icons = false;
        let app = App::new(config);
        assert!(!app.show_icons);
        assert!(app.running.is_none(), "nothing GPU-backed before resume");
    }
}
