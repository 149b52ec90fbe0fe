//! Type-safe handles to GPU resources.
//!
//! The scene graph never holds wgpu objects directly. Buffers, textures and
//! pipelines live in the backend's resource registry and are referenced by these
//! small copyable ids, which keeps the scene graph plain data and lets a frame be
//! encoded without a device.

/// Handle to a vertex or index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

/// Handle to a texture plus its sampler binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Handle to a render pipeline (vertex layout + shader pair).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(pub(crate) usize);

impl BufferId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl PipelineId {
    pub fn index(self) -> usize {
        self.0
    }
}
