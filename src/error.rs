//! Error types.
//!
//! [`RenderError`] covers everything that can go wrong while the renderer is being
//! set up. None of these have a degraded mode: the host logs them and exits.
//! Per-frame conditions (a missing drawable, an empty scene) are not errors at all.

use thiserror::Error;

/// Fatal setup-time failures.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No GPU adapter compatible with the surface.
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to hand out a device/queue.
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The window could not be turned into a presentable surface.
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// A shader function was looked up by a name the library does not know.
    #[error("shader function '{0}' not found in library")]
    ShaderNotFound(String),

    /// The device rejected a pipeline descriptor.
    #[error("failed to build pipeline '{label}': {message}")]
    PipelineCreation { label: String, message: String },

    /// Mesh data could not be converted into GPU buffers.
    #[error("failed to upload mesh '{label}': {reason}")]
    MeshUpload { label: String, reason: String },

    /// Texture bytes could not be decoded.
    #[error("failed to decode texture: {0}")]
    Texture(#[from] image::ImageError),

    /// The host event loop failed to start or exited abnormally.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Window creation failed.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// The initial scene asked for more lights than the shader holds.
    #[error(transparent)]
    Lighting(#[from] LightingError),
}

/// Rejected mutations of [`Lighting`](crate::Lighting).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingError {
    /// The shader-side light array is full.
    #[error("light capacity exceeded (max {capacity})")]
    CapacityExceeded { capacity: usize },
}
