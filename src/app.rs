use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::renderer::{Renderer, RendererConfig};
use crate::scene::Scene;
use crate::wgpu_backend::WgpuBackend;

/// Radians of orbit per pixel of mouse drag.
const ORBIT_SENSITIVITY: f32 = 0.005;
/// Distance change per scroll line.
const ZOOM_STEP: f32 = 0.25;

/// Configuration for the app window and renderer.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Lantern".to_string(),
            width: 800,
            height: 600,
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Open a window and render `setup`'s scene once per redraw until it is closed.
///
/// `setup` runs once, after the device exists, and builds the scene: pipelines,
/// textures and meshes are created through the backend it receives. Any error it
/// returns stops the app and is returned from here.
///
/// Dragging with the left mouse button orbits the camera; the scroll wheel zooms.
///
/// # Example
/// ```ignore
/// lantern::run_with_config(AppConfig::new().title("House").size(1280, 720), |backend| {
///     let lit = backend.create_pipeline(&PipelineConfig::lit())?;
///     // ...upload meshes, build models...
///     Ok(scene::build_scene(models)?)
/// })?;
/// ```
pub fn run_with_config<S>(config: AppConfig, setup: S) -> Result<(), RenderError>
where
    S: FnOnce(&mut WgpuBackend) -> Result<Scene, RenderError> + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = LanternApp {
        state: AppState::Pending {
            config,
            setup: Box::new(setup),
        },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut WgpuBackend) -> Result<Scene, RenderError>>;

struct LanternApp {
    state: AppState,
    error: Option<RenderError>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: SetupFn,
    },
    Running {
        window: Arc<Window>,
        backend: WgpuBackend,
        renderer: Renderer,
        drag: OrbitDrag,
    },
    Stopped,
}

/// Mouse state for orbiting the camera.
#[derive(Default)]
struct OrbitDrag {
    active: bool,
    last_cursor: Option<Vec2>,
}

fn start(
    event_loop: &ActiveEventLoop,
    config: AppConfig,
    setup: SetupFn,
) -> Result<AppState, RenderError> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
    let window = Arc::new(event_loop.create_window(window_attrs)?);

    let gpu = GpuContext::new(window.clone())?;
    let mut backend = WgpuBackend::new(gpu);
    let scene = setup(&mut backend)?;

    let mut renderer = Renderer::new(scene, config.renderer);
    let size = window.inner_size();
    renderer.resize(&mut backend, size.width, size.height);
    window.request_redraw();

    Ok(AppState::Running {
        window,
        backend,
        renderer,
        drag: OrbitDrag::default(),
    })
}

impl ApplicationHandler for LanternApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Pending { .. }) {
            return;
        }
        let AppState::Pending { config, setup } =
            std::mem::replace(&mut self.state, AppState::Stopped)
        else {
            return;
        };

        match start(event_loop, config, setup) {
            Ok(running) => self.state = running,
            Err(err) => {
                log::error!("setup failed: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running {
            window,
            backend,
            renderer,
            drag,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                renderer.resize(backend, size.width, size.height);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                drag.active = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                if let (true, Some(last)) = (drag.active, drag.last_cursor) {
                    let delta = (cursor - last) * ORBIT_SENSITIVITY;
                    renderer.camera_mut().orbit(-delta.x, -delta.y);
                }
                drag.last_cursor = Some(cursor);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                renderer.camera_mut().zoom(-lines * ZOOM_STEP);
            }
            WindowEvent::RedrawRequested => {
                renderer.render(backend);
                if backend.is_fatal() {
                    log::error!("GPU surface is unrecoverable, exiting");
                    event_loop.exit();
                    return;
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}
