//! Explicit scene construction.
//!
//! The scene is built in a fixed order before the first frame: camera, then
//! lighting, then models. Nothing is created lazily on first access.

use glam::Vec3;

use crate::camera::ArcballCamera;
use crate::error::LightingError;
use crate::light::Light;
use crate::lighting::Lighting;

use super::{Model, Scene};

/// Orbit camera looking slightly down at a model about a metre tall.
pub fn default_camera() -> ArcballCamera {
    ArcballCamera::new()
        .distance(4.3)
        .target([0.0, 1.2, 0.0])
        .pitch((-10.0f32).to_radians())
}

/// A sun, a green-tinted ambient fill, a red point light, and a magenta spot.
pub fn default_lights() -> Vec<Light> {
    let sun = Light::sun(-Vec3::new(1.0, 2.0, -2.0));

    let ambient = Light::ambient([0.5, 1.0, 0.0], 0.15);

    let red = Light::point([0.0, 0.5, -0.5])
        .color([1.0, 0.0, 0.0])
        .attenuation(1.0, 3.0, 4.0);

    let spot = Light::spot(
        [0.4, 0.8, 1.0],
        [-2.0, 0.0, -1.5],
        40f32.to_radians(),
        12.0,
    )
    .color([1.0, 0.0, 1.0])
    .attenuation(1.0, 0.5, 0.0);

    vec![sun, ambient, red, spot]
}

/// Build the scene: [`default_camera`], then [`default_lights`], then `models` in order.
pub fn build_scene(models: Vec<Model>) -> Result<Scene, LightingError> {
    let camera = default_camera();

    let mut lighting = Lighting::new();
    for light in default_lights() {
        lighting.add(light)?;
    }

    let mut scene = Scene::new(camera, lighting);
    for model in models {
        scene.add_model(model);
    }
    log::info!(
        "scene built: {} models, {} lights, {} submeshes",
        scene.models().len(),
        scene.lighting().len(),
        scene.submesh_count()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::PipelineId;
    use crate::light::LightKind;

    #[test]
    fn builds_camera_lights_then_models() {
        let scene = build_scene(vec![
            Model::new("house", PipelineId(0)),
            Model::new("tree", PipelineId(0)),
        ])
        .unwrap();

        assert_eq!(scene.camera().distance, 4.3);
        assert_eq!(scene.lighting().len(), 4);
        assert_eq!(scene.lighting().lights().count, 4);
        assert_eq!(scene.models()[1].name, "tree");
    }

    #[test]
    fn default_lights_cover_every_kind() {
        let lights = default_lights();
        assert!(matches!(lights[0].kind, LightKind::Sun { .. }));
        assert_eq!(lights[1].kind, LightKind::Ambient);
        assert_eq!(lights[2].kind, LightKind::Point);
        assert!(matches!(lights[3].kind, LightKind::Spot { .. }));
    }
}
