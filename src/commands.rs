//! The per-frame command stream.
//!
//! [`Renderer`](crate::Renderer) never talks to wgpu directly. It encodes each frame as
//! an ordered `Vec<RenderCommand>` and hands it to a
//! [`RenderBackend`](crate::RenderBackend), which replays it against the device. The
//! stream for one frame looks like:
//!
//! ```text
//! BeginPass
//! BindDepthStencil
//! BindFrameUniforms
//! ( BindModelUniforms  BindPipeline
//!   ( BindVertexBuffer
//!     ( BindTexture  DrawIndexed )*   -- per submesh
//!   )*                                -- per mesh
//! )*                                  -- per model, then per light marker
//! EndPass
//! Present
//! ```

use glam::{Mat3, Mat4, Vec3};

use crate::handles::{BufferId, PipelineId, TextureId};
use crate::lighting::PackedLights;
use crate::mesh::IndexFormat;
use crate::pipeline::DepthState;

/// RGBA clear color for the color attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

/// Texture binding points of the fragment stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    BaseColor,
}

/// Per-draw vertex uniforms. Matches `struct Uniforms` in the WGSL shaders.
///
/// The normal matrix is a `mat3x3<f32>` on the GPU, which stores each column in 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
}

impl Uniforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4, normal_matrix: Mat3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            normal_matrix: [
                normal_matrix.x_axis.extend(0.0).to_array(),
                normal_matrix.y_axis.extend(0.0).to_array(),
                normal_matrix.z_axis.extend(0.0).to_array(),
            ],
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    pub fn normal_matrix(&self) -> Mat3 {
        let [x, y, z] = self.normal_matrix;
        Mat3::from_cols(
            Vec3::new(x[0], x[1], x[2]),
            Vec3::new(y[0], y[1], y[2]),
            Vec3::new(z[0], z[1], z[2]),
        )
    }
}

/// Per-frame fragment uniforms. Matches `struct FragmentUniforms` in `shaders/lit.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FragmentUniforms {
    pub camera_position: [f32; 3],
    pub light_count: u32,
}

/// One step of a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Start the render pass on the acquired drawable, clearing color and depth.
    BeginPass {
        clear_color: ClearColor,
        clear_depth: f32,
    },
    BindDepthStencil(DepthState),
    /// Camera position and the packed light array, bound once for the whole pass.
    BindFrameUniforms {
        fragment: FragmentUniforms,
        lights: PackedLights,
    },
    /// Per-model vertex uniforms. `slot` is unique per model within a frame.
    BindModelUniforms { slot: u32, uniforms: Uniforms },
    BindPipeline(PipelineId),
    BindVertexBuffer(BufferId),
    BindTexture {
        slot: TextureSlot,
        texture: TextureId,
    },
    DrawIndexed {
        index_buffer: BufferId,
        index_count: u32,
        index_format: IndexFormat,
        /// Byte offset into `index_buffer`.
        index_offset: u64,
    },
    EndPass,
    /// Submit the encoded work, then present the drawable.
    Present,
}

impl RenderCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, RenderCommand::DrawIndexed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl() {
        // 3 x mat4x4 + mat3x3 (3 x 16-byte columns)
        assert_eq!(std::mem::size_of::<Uniforms>(), 240);
        assert_eq!(std::mem::size_of::<FragmentUniforms>(), 16);
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let normal = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let uniforms = Uniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, normal);
        assert_eq!(uniforms.normal_matrix[1], [4.0, 5.0, 6.0, 0.0]);
        assert_eq!(uniforms.normal_matrix(), normal);
    }
}
