use std::process::ExitCode;

use lantern::{
    AppConfig, LightMarker, MeshData, Model, PipelineConfig, RenderError, RendererConfig, Scene,
    Texture, Transform, Vec3, VertexLayout, WgpuBackend, init_logging, logging::LoggingConfig,
    run_with_config, scene,
};

fn main() -> ExitCode {
    init_logging(LoggingConfig::new());

    let wireframe = std::env::args().any(|arg| arg == "--wireframe");
    let config = AppConfig::new()
        .title("Lantern")
        .size(1280, 720)
        .renderer(RendererConfig::default().show_lights(true));
    match run_with_config(config, move |backend| build(backend, wireframe)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// A house on a patch of ground, with an unlit marker sphere beside it and small
/// spheres showing where the point and spot lights sit.
fn build(backend: &mut WgpuBackend, wireframe: bool) -> Result<Scene, RenderError> {
    let lit = backend.create_pipeline(&PipelineConfig::lit().wireframe(wireframe))?;
    let flat = backend.create_pipeline(&PipelineConfig::flat())?;

    let walls = backend.add_texture(Texture::checker(backend.gpu(), 256, 8));
    let grass = backend.add_texture(Texture::solid(backend.gpu(), [96, 140, 72, 255], "Grass"));

    let cube = backend.upload_mesh(&MeshData::cube(walls), VertexLayout::PositionNormalUv)?;
    let ground = backend.upload_mesh(&MeshData::plane(8.0, grass), VertexLayout::PositionNormalUv)?;
    let marker = backend.upload_mesh(&MeshData::sphere(24, 16, walls), VertexLayout::Position)?;

    let house = Model::new("house", lit)
        .with_transform(
            Transform::new()
                .position(Vec3::new(0.0, 0.8, 0.0))
                .rotation(Vec3::new(0.0, 35f32.to_radians(), 0.0))
                .uniform_scale(1.6),
        )
        .with_mesh(cube);

    let ground = Model::new("ground", lit).with_mesh(ground);

    let marker = Model::new("marker", flat)
        .with_transform(
            Transform::new()
                .position(Vec3::new(-1.8, 0.3, 1.0))
                .uniform_scale(0.6),
        )
        .with_mesh(marker);

    let mut scene = scene::build_scene(vec![house, ground, marker])?;
    let bulb = backend.upload_mesh(&MeshData::sphere(12, 8, walls), VertexLayout::Position)?;
    scene.set_light_marker(LightMarker::new(flat, bulb).scale(0.08));
    Ok(scene)
}
