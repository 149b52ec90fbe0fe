use crate::handles::PipelineId;
use crate::mesh::Mesh;

use super::transform::Transform;

/// A drawable object: a transform, its meshes, and the pipeline that draws them.
///
/// The pipeline is chosen when the model is created and never re-evaluated per
/// frame. Meshes are drawn in the order they were added.
#[derive(Clone, Debug)]
pub struct Model {
    /// Shown in log output.
    pub name: String,
    pub transform: Transform,
    pub meshes: Vec<Mesh>,
    pipeline: PipelineId,
}

impl Model {
    pub fn new(name: impl Into<String>, pipeline: PipelineId) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            meshes: Vec::new(),
            pipeline,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    /// Number of draw calls this model issues per frame.
    pub fn submesh_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.submeshes.len()).sum()
    }
}

/// Geometry drawn at every point and spot light when light markers are enabled.
///
/// The mesh is uploaded once at setup and reused for each light; only its
/// per-light transform changes between draws.
#[derive(Clone, Debug)]
pub struct LightMarker {
    pub pipeline: PipelineId,
    pub mesh: Mesh,
    /// Uniform scale applied to the mesh at each light position.
    pub scale: f32,
}

impl LightMarker {
    pub fn new(pipeline: PipelineId, mesh: Mesh) -> Self {
        Self {
            pipeline,
            mesh,
            scale: 0.1,
        }
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix placing the marker at `position`.
    pub fn transform_at(&self, position: glam::Vec3) -> Transform {
        Transform::from_position(position).uniform_scale(self.scale)
    }
}
