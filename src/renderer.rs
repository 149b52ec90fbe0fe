//! Per-frame orchestration.
//!
//! The [`Renderer`] owns the [`Scene`] and turns it into a [`RenderCommand`] stream once
//! per tick. Camera and lighting state are read fresh every frame; model matrices are
//! recomputed from each model's [`Transform`](crate::Transform) and never cached.

use crate::backend::RenderBackend;
use glam::Mat4;

use crate::camera::ArcballCamera;
use crate::commands::{ClearColor, FragmentUniforms, RenderCommand, TextureSlot, Uniforms};
use crate::error::LightingError;
use crate::light::{Light, LightKind};
use crate::pipeline::DepthState;
use crate::mesh::Mesh;
use crate::scene::{Model, Scene};

/// Renderer settings fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    pub clear_color: ClearColor,
    /// Draw the scene's [`LightMarker`](crate::scene::LightMarker) at every point and spot light.
    pub show_lights: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: ClearColor::new(0.7, 0.9, 1.0, 1.0),
            show_lights: false,
        }
    }
}

impl RendererConfig {
    pub fn clear_color(mut self, r: f64, g: f64, b: f64, a: f64) -> Self {
        self.clear_color = ClearColor::new(r, g, b, a);
        self
    }

    pub fn show_lights(mut self, show: bool) -> Self {
        self.show_lights = show;
        self
    }
}

/// Where the renderer is in its frame cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    /// Commands are being encoded or replayed.
    FrameInFlight,
}

/// What happened to one call of [`Renderer::render`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented { draw_calls: usize },
    /// No drawable was available. Nothing was encoded or presented.
    Skipped,
}

/// Running counters, logged at trace level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub last_draw_calls: usize,
}

pub struct Renderer {
    scene: Scene,
    config: RendererConfig,
    state: FrameState,
    stats: FrameStats,
    // Reused across frames to avoid reallocating the command list.
    commands: Vec<RenderCommand>,
}

impl Renderer {
    pub fn new(scene: Scene, config: RendererConfig) -> Self {
        Self {
            scene,
            config,
            state: FrameState::Idle,
            stats: FrameStats::default(),
            commands: Vec::new(),
        }
    }

    /// Render one frame.
    ///
    /// Acquires a drawable from `backend`; if none is available the frame is
    /// skipped without encoding anything. Otherwise the scene is encoded and
    /// submitted, and the backend presents it.
    pub fn render<B: RenderBackend>(&mut self, backend: &mut B) -> FrameOutcome {
        debug_assert_eq!(self.state, FrameState::Idle);

        let Some(drawable) = backend.acquire_drawable() else {
            self.stats.frames_skipped += 1;
            log::trace!("no drawable available, skipping frame");
            return FrameOutcome::Skipped;
        };

        self.state = FrameState::FrameInFlight;
        self.commands.clear();
        let draw_calls = encode_frame(&self.scene, &self.config, &mut self.commands);
        backend.submit(drawable, &self.commands);
        self.state = FrameState::Idle;

        self.stats.frames_presented += 1;
        self.stats.last_draw_calls = draw_calls;
        log::trace!(
            "frame {}: {} commands, {} draws",
            self.stats.frames_presented,
            self.commands.len(),
            draw_calls
        );
        FrameOutcome::Presented { draw_calls }
    }

    /// Forward a surface resize to the camera and the backend.
    pub fn resize<B: RenderBackend>(&mut self, backend: &mut B, width: u32, height: u32) {
        log::debug!("resize to {width}x{height}");
        self.scene.camera_mut().set_aspect(width, height);
        backend.resize(width, height);
    }

    pub fn add_model(&mut self, model: Model) -> usize {
        self.scene.add_model(model)
    }

    pub fn remove_model(&mut self, index: usize) -> Option<Model> {
        self.scene.remove_model(index)
    }

    pub fn add_light(&mut self, light: Light) -> Result<usize, LightingError> {
        self.scene.add_light(light)
    }

    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        self.scene.remove_light(index)
    }

    pub fn camera_mut(&mut self) -> &mut ArcballCamera {
        self.scene.camera_mut()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Append the commands for one frame of `scene` to `out`. Returns the number of draws.
pub fn encode_frame(
    scene: &Scene,
    config: &RendererConfig,
    out: &mut Vec<RenderCommand>,
) -> usize {
    let camera = scene.camera();
    let view = camera.view_matrix();
    let projection = camera.projection_matrix();
    let lights = scene.lighting().lights();

    out.push(RenderCommand::BeginPass {
        clear_color: config.clear_color,
        clear_depth: 1.0,
    });
    out.push(RenderCommand::BindDepthStencil(DepthState::LESS_WRITE));
    out.push(RenderCommand::BindFrameUniforms {
        fragment: FragmentUniforms {
            camera_position: camera.position().to_array(),
            light_count: lights.count,
        },
        lights,
    });

    let mut draws = 0;
    let mut slot = 0;
    let mut bind_model = |out: &mut Vec<RenderCommand>, model_matrix: Mat4| {
        out.push(RenderCommand::BindModelUniforms {
            slot,
            uniforms: Uniforms::new(
                model_matrix,
                view,
                projection,
                crate::scene::normal_matrix(&model_matrix),
            ),
        });
        slot += 1;
    };

    for model in scene.models() {
        bind_model(out, model.transform.matrix());
        out.push(RenderCommand::BindPipeline(model.pipeline()));
        for mesh in &model.meshes {
            draws += encode_mesh(mesh, out);
        }
    }

    if let Some(marker) = scene.light_marker().filter(|_| config.show_lights) {
        for light in scene.lighting().iter().filter(|light| shows_marker(light)) {
            bind_model(out, marker.transform_at(light.position).matrix());
            out.push(RenderCommand::BindPipeline(marker.pipeline));
            draws += encode_mesh(&marker.mesh, out);
        }
    }

    out.push(RenderCommand::EndPass);
    out.push(RenderCommand::Present);
    draws
}

/// Bind `mesh` and draw each of its submeshes. Returns the number of draws.
fn encode_mesh(mesh: &Mesh, out: &mut Vec<RenderCommand>) -> usize {
    out.push(RenderCommand::BindVertexBuffer(mesh.vertex_buffer));
    for submesh in &mesh.submeshes {
        out.push(RenderCommand::BindTexture {
            slot: TextureSlot::BaseColor,
            texture: submesh.textures.base_color,
        });
        out.push(RenderCommand::DrawIndexed {
            index_buffer: submesh.index_buffer,
            index_count: submesh.index_count,
            index_format: submesh.index_format,
            index_offset: submesh.index_offset,
        });
    }
    mesh.submeshes.len()
}

/// Only lights with a position get a marker.
fn shows_marker(light: &Light) -> bool {
    matches!(light.kind, LightKind::Point | LightKind::Spot { .. })
}
