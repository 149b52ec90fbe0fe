//! # Lantern
//!
//! **A small forward renderer for lit, textured scenes.**
//!
//! A scene is an orbit camera, up to [`MAX_LIGHTS`] lights, and a flat list of models.
//! Each frame the [`Renderer`] turns it into an ordered list of [`RenderCommand`]s which
//! a [`RenderBackend`] replays; [`WgpuBackend`] draws them with wgpu.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lantern::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     init_logging(logging::LoggingConfig::new());
//!
//!     run_with_config(AppConfig::new().title("Cube"), |backend| {
//!         let lit = backend.create_pipeline(&PipelineConfig::lit())?;
//!         let checker = backend.add_texture(Texture::checker(backend.gpu(), 256, 8));
//!         let cube = backend.upload_mesh(&MeshData::cube(checker), VertexLayout::PositionNormalUv)?;
//!
//!         let model = Model::new("cube", lit)
//!             .with_transform(Transform::new().rotation(Vec3::new(0.0, 0.6, 0.0)))
//!             .with_mesh(cube);
//!         Ok(scene::build_scene(vec![model])?)
//!     })
//! }
//! ```
//!
//! ## Frame protocol
//!
//! Every frame clears color and depth, binds the depth state and the frame uniforms
//! (camera position and lights) once, then for each model binds its uniforms and
//! pipeline, and for each submesh binds its texture and issues one indexed draw. With
//! [`RendererConfig::show_lights`] set, a [`LightMarker`] is then drawn at every point and
//! spot light. If the surface has no drawable available the frame is skipped entirely.

mod app;
mod backend;
mod camera;
mod commands;
mod error;
mod gpu;
mod handles;
mod light;
mod lighting;
pub mod logging;
mod mesh;
mod pipeline;
mod renderer;
pub mod scene;
mod texture;
mod wgpu_backend;

pub use app::{AppConfig, run_with_config};
pub use backend::RenderBackend;
pub use camera::{ArcballCamera, MIN_DISTANCE, orbit_direction};
pub use commands::{ClearColor, FragmentUniforms, RenderCommand, TextureSlot, Uniforms};
pub use error::{LightingError, RenderError};
pub use gpu::{GpuContext, MAX_FRAME_LATENCY, SurfaceErrorAction};
pub use handles::{BufferId, PipelineId, TextureId};
pub use light::{GpuLight, Light, LightKind};
pub use lighting::{Lighting, MAX_LIGHTS, PackedLights};
pub use logging::init_logging;
pub use mesh::{
    IndexFormat, Mesh, MeshData, PackedIndices, Submesh, SubmeshData, SubmeshTextures, Vertex3d,
};
pub use pipeline::{
    DepthState, PipelineConfig, ShaderFunction, ShaderLibrary, VertexLayout,
};
pub use renderer::{
    FrameOutcome, FrameState, FrameStats, Renderer, RendererConfig, encode_frame,
};
pub use scene::{LightMarker, Model, Scene, Transform};
pub use texture::Texture;
pub use wgpu_backend::WgpuBackend;

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
