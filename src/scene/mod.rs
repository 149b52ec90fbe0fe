//! The scene graph: camera, lights, and a flat list of models.
//!
//! Nesting is fixed at one level: a [`Scene`] holds [`Model`]s, a model holds
//! [`Mesh`](crate::Mesh)es, a mesh holds [`Submesh`](crate::Submesh)es. The host mutates the
//! scene between frames; the renderer only reads it while a frame is encoded.
//!
//! # Example
//!
//! ```ignore
//! use lantern::*;
//!
//! let lit = backend.create_pipeline(&PipelineConfig::lit())?;
//! let texture = backend.add_texture(Texture::checker(backend.gpu(), 64, 8));
//! let cube = backend.upload_mesh(&MeshData::cube(texture), VertexLayout::PositionNormalUv)?;
//!
//! let house = Model::new("house", lit)
//!     .with_transform(Transform::new().rotation(Vec3::new(0.0, 35f32.to_radians(), 0.0)))
//!     .with_mesh(cube);
//!
//! let scene = scene::build_scene(vec![house])?;
//! ```

mod model;
mod setup;
mod transform;

pub use model::{LightMarker, Model};
pub use setup::{build_scene, default_camera, default_lights};
pub use transform::{Transform, normal_matrix};

use crate::camera::ArcballCamera;
use crate::error::LightingError;
use crate::light::Light;
use crate::lighting::Lighting;

/// Everything one frame renders.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    camera: ArcballCamera,
    lighting: Lighting,
    models: Vec<Model>,
    light_marker: Option<LightMarker>,
}

impl Scene {
    pub fn new(camera: ArcballCamera, lighting: Lighting) -> Self {
        Self {
            camera,
            lighting,
            models: Vec::new(),
            light_marker: None,
        }
    }

    /// Append a model, returning its index in draw order.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    /// Remove the model at `index`. Later models shift down by one.
    pub fn remove_model(&mut self, index: usize) -> Option<Model> {
        (index < self.models.len()).then(|| self.models.remove(index))
    }

    pub fn add_light(&mut self, light: Light) -> Result<usize, LightingError> {
        self.lighting.add(light)
    }

    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        self.lighting.remove(index)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn camera(&self) -> &ArcballCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ArcballCamera {
        &mut self.camera
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut Lighting {
        &mut self.lighting
    }

    /// Geometry used to visualize point and spot lights.
    pub fn set_light_marker(&mut self, marker: LightMarker) {
        self.light_marker = Some(marker);
    }

    pub fn light_marker(&self) -> Option<&LightMarker> {
        self.light_marker.as_ref()
    }

    /// Draw calls one frame issues for the models alone.
    pub fn submesh_count(&self) -> usize {
        self.models.iter().map(Model::submesh_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{BufferId, PipelineId, TextureId};
    use crate::mesh::{IndexFormat, Mesh, Submesh, SubmeshTextures};

    fn submesh(count: u32) -> Submesh {
        Submesh {
            index_buffer: BufferId(1),
            index_count: count,
            index_format: IndexFormat::U16,
            index_offset: 0,
            textures: SubmeshTextures {
                base_color: TextureId(0),
            },
        }
    }

    #[test]
    fn submesh_count_spans_all_models() {
        let mut scene = Scene::default();
        scene.add_model(
            Model::new("a", PipelineId(0))
                .with_mesh(Mesh::new(BufferId(0)).with_submesh(submesh(3)))
                .with_mesh(
                    Mesh::new(BufferId(0))
                        .with_submesh(submesh(6))
                        .with_submesh(submesh(9)),
                ),
        );
        scene.add_model(Model::new("empty", PipelineId(0)));
        assert_eq!(scene.submesh_count(), 3);
    }

    #[test]
    fn remove_model_preserves_order() {
        let mut scene = Scene::default();
        for name in ["a", "b", "c"] {
            scene.add_model(Model::new(name, PipelineId(0)));
        }
        assert_eq!(scene.remove_model(1).map(|m| m.name), Some("b".to_string()));
        let names: Vec<_> = scene.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert!(scene.remove_model(5).is_none());
    }
}
