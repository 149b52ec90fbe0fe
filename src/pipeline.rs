//! Pipeline configuration and the shader library.
//!
//! A [`PipelineConfig`] names a vertex/fragment function pair and the
//! [`VertexLayout`] of the buffers it reads. Functions are resolved by name through
//! a [`ShaderLibrary`], much like looking up entry points in a compiled shader
//! archive. Resolution and pipeline construction happen at setup only; a missing
//! function or a rejected descriptor is fatal.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::mesh::Vertex3d;

/// How vertex buffers are laid out for a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// Interleaved [`Vertex3d`]: position, normal, uv (32 bytes).
    PositionNormalUv,
    /// Tightly packed positions only (12 bytes).
    Position,
}

impl VertexLayout {
    const FULL_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x3];

    /// Bytes per vertex.
    pub const fn stride(self) -> u64 {
        match self {
            VertexLayout::PositionNormalUv => std::mem::size_of::<Vertex3d>() as u64,
            VertexLayout::Position => std::mem::size_of::<[f32; 3]>() as u64,
        }
    }

    /// The wgpu descriptor for slot 0.
    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::PositionNormalUv => &Self::FULL_ATTRIBUTES,
            VertexLayout::Position => &Self::POSITION_ATTRIBUTES,
        };
        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Depth-stencil state bound once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthState {
    pub compare: wgpu::CompareFunction,
    pub write_enabled: bool,
}

impl DepthState {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Nearer fragments win and update the buffer.
    pub const LESS_WRITE: Self = Self {
        compare: wgpu::CompareFunction::Less,
        write_enabled: true,
    };

    pub fn to_wgpu(self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::FORMAT,
            depth_write_enabled: self.write_enabled,
            depth_compare: self.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Everything needed to build one render pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineConfig {
    pub label: String,
    pub vertex_function: String,
    pub fragment_function: String,
    pub vertex_layout: VertexLayout,
    /// Rasterize triangle edges only. Needs a device with `POLYGON_MODE_LINE`.
    pub wireframe: bool,
}

impl PipelineConfig {
    pub fn new(
        label: impl Into<String>,
        vertex_function: impl Into<String>,
        fragment_function: impl Into<String>,
        vertex_layout: VertexLayout,
    ) -> Self {
        Self {
            label: label.into(),
            vertex_function: vertex_function.into(),
            fragment_function: fragment_function.into(),
            vertex_layout,
            wireframe: false,
        }
    }

    pub fn wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    /// Rasterizer state shared by every pipeline: triangle lists, counter-clockwise
    /// front faces, back faces culled.
    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            polygon_mode: if self.wireframe {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
            ..Default::default()
        }
    }

    /// Textured, lit geometry with the full vertex layout.
    pub fn lit() -> Self {
        Self::new(
            "Lit Pipeline",
            "vertex_main",
            "fragment_main",
            VertexLayout::PositionNormalUv,
        )
    }

    /// Unlit, position-only geometry.
    pub fn flat() -> Self {
        Self::new(
            "Flat Pipeline",
            "vertex_flat",
            "fragment_flat",
            VertexLayout::Position,
        )
    }
}

/// A compiled shader function: a module and the entry point inside it.
#[derive(Clone, Debug)]
pub struct ShaderFunction {
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
}

/// Source of one built-in WGSL module and the entry points it exports.
struct BuiltinModule {
    label: &'static str,
    source: &'static str,
    entry_points: &'static [&'static str],
}

const BUILTIN_MODULES: &[BuiltinModule] = &[
    BuiltinModule {
        label: "Lit Shader",
        source: include_str!("shaders/lit.wgsl"),
        entry_points: &["vertex_main", "fragment_main"],
    },
    BuiltinModule {
        label: "Flat Shader",
        source: include_str!("shaders/flat.wgsl"),
        entry_points: &["vertex_flat", "fragment_flat"],
    },
];

/// Named shader functions available to pipelines.
#[derive(Default)]
pub struct ShaderLibrary {
    functions: HashMap<String, ShaderFunction>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the built-in modules and register their entry points.
    pub fn with_builtins(device: &wgpu::Device) -> Self {
        let mut library = Self::new();
        for builtin in BUILTIN_MODULES {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(builtin.label),
                source: wgpu::ShaderSource::Wgsl(builtin.source.into()),
            });
            for entry_point in builtin.entry_points {
                library.insert(*entry_point, module.clone(), *entry_point);
            }
        }
        log::debug!("shader library has {} functions", library.len());
        library
    }

    /// Register `entry_point` of `module` under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        module: wgpu::ShaderModule,
        entry_point: impl Into<String>,
    ) {
        self.functions.insert(
            name.into(),
            ShaderFunction {
                module,
                entry_point: entry_point.into(),
            },
        );
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Result<&ShaderFunction, RenderError> {
        self.functions
            .get(name)
            .ok_or_else(|| RenderError::ShaderNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_vertex_sizes() {
        let full = VertexLayout::PositionNormalUv.buffer_layout();
        assert_eq!(full.array_stride, 32);
        assert_eq!(full.attributes.len(), 3);
        assert_eq!(full.attributes[2].offset, 24);

        let position = VertexLayout::Position.buffer_layout();
        assert_eq!(position.array_stride, 12);
        assert_eq!(position.attributes.len(), 1);
    }

    #[test]
    fn depth_state_is_less_with_writes() {
        let state = DepthState::LESS_WRITE.to_wgpu();
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);
        assert!(state.depth_write_enabled);
        assert_eq!(state.format, wgpu::TextureFormat::Depth32Float);
    }

    #[test]
    fn wireframe_switches_polygon_mode_only() {
        let filled = PipelineConfig::lit().primitive_state();
        assert_eq!(filled.polygon_mode, wgpu::PolygonMode::Fill);
        assert_eq!(filled.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(filled.front_face, wgpu::FrontFace::Ccw);

        let lines = PipelineConfig::lit().wireframe(true).primitive_state();
        assert_eq!(lines.polygon_mode, wgpu::PolygonMode::Line);
        assert_eq!(lines.cull_mode, filled.cull_mode);
        assert_eq!(lines.topology, filled.topology);
    }

    #[test]
    fn missing_function_is_an_error() {
        let library = ShaderLibrary::new();
        match library.function("vertex_main") {
            Err(RenderError::ShaderNotFound(name)) => assert_eq!(name, "vertex_main"),
            other => panic!("expected ShaderNotFound, got {other:?}"),
        }
    }

    #[test]
    fn builtin_sources_export_their_entry_points() {
        for builtin in BUILTIN_MODULES {
            for entry_point in builtin.entry_points {
                assert!(
                    builtin.source.contains(&format!("fn {entry_point}(")),
                    "{} is missing {entry_point}",
                    builtin.label
                );
            }
        }
    }
}
