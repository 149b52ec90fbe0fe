//! Mesh geometry on both sides of the upload.
//!
//! - [`Vertex3d`]: The interleaved vertex format, position + normal + uv
//! - [`MeshData`]: CPU-side geometry as produced by an importer or a primitive generator
//! - [`Mesh`] / [`Submesh`]: GPU-resident geometry, referenced through handles
//!
//! A [`MeshData`] is converted once at setup by
//! [`WgpuBackend::upload_mesh`](crate::WgpuBackend::upload_mesh): one vertex buffer per
//! mesh and one shared index buffer whose submesh ranges are addressed by byte offset.
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::error::RenderError;
use crate::handles::{BufferId, TextureId};
use crate::pipeline::VertexLayout;

/// A vertex with position, normal, and texture coordinates (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Surface normal, expected to be normalized.
    pub normal: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Element width of an index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Bytes per index.
    pub const fn byte_width(self) -> u64 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    /// Narrowest format able to address `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }

    pub fn to_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Textures sampled by one submesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmeshTextures {
    pub base_color: TextureId,
}

/// CPU-side index range of one material.
#[derive(Clone, Debug)]
pub struct SubmeshData {
    pub indices: Vec<u32>,
    pub textures: SubmeshTextures,
}

impl SubmeshData {
    pub fn new(indices: Vec<u32>, base_color: TextureId) -> Self {
        Self {
            indices,
            textures: SubmeshTextures { base_color },
        }
    }
}

/// CPU-side geometry awaiting upload.
#[derive(Clone, Debug)]
pub struct MeshData {
    /// Used in buffer labels and error messages.
    pub label: String,
    pub vertices: Vec<Vertex3d>,
    pub submeshes: Vec<SubmeshData>,
}

/// Index data for all submeshes of a mesh, packed into one buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedIndices {
    pub format: IndexFormat,
    pub bytes: Vec<u8>,
    /// `(byte offset, index count)` of each submesh, in submesh order.
    pub ranges: Vec<(u64, u32)>,
}

impl MeshData {
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex3d>) -> Self {
        Self {
            label: label.into(),
            vertices,
            submeshes: Vec::new(),
        }
    }

    /// Append a submesh.
    pub fn submesh(mut self, indices: Vec<u32>, base_color: TextureId) -> Self {
        self.submeshes.push(SubmeshData::new(indices, base_color));
        self
    }

    /// Check the data can be uploaded and drawn.
    pub fn validate(&self) -> Result<(), RenderError> {
        let fail = |reason: String| RenderError::MeshUpload {
            label: self.label.clone(),
            reason,
        };
        if self.vertices.is_empty() {
            return Err(fail("no vertices".into()));
        }
        if self.submeshes.is_empty() {
            return Err(fail("no submeshes".into()));
        }
        for (i, submesh) in self.submeshes.iter().enumerate() {
            if submesh.indices.is_empty() {
                return Err(fail(format!("submesh {i} has no indices")));
            }
            if let Some(&bad) = submesh
                .indices
                .iter()
                .find(|&&index| index as usize >= self.vertices.len())
            {
                return Err(fail(format!(
                    "submesh {i} references vertex {bad} of {}",
                    self.vertices.len()
                )));
            }
        }
        Ok(())
    }

    /// Vertex buffer contents for the given layout.
    pub fn vertex_bytes(&self, layout: VertexLayout) -> Vec<u8> {
        match layout {
            VertexLayout::PositionNormalUv => bytemuck::cast_slice(&self.vertices).to_vec(),
            VertexLayout::Position => {
                let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.position).collect();
                bytemuck::cast_slice(&positions).to_vec()
            }
        }
    }

    /// Pack every submesh's indices into one buffer.
    ///
    /// Each range starts on a 4-byte boundary so its offset is valid for either
    /// index width.
    pub fn pack_indices(&self) -> PackedIndices {
        let format = IndexFormat::for_vertex_count(self.vertices.len());
        let index_total: usize = self.submeshes.iter().map(|s| s.indices.len()).sum();
        let mut bytes = Vec::with_capacity(
            index_total * format.byte_width() as usize + 4 * self.submeshes.len(),
        );
        let mut ranges = Vec::with_capacity(self.submeshes.len());

        for submesh in &self.submeshes {
            let offset = bytes.len() as u64;
            match format {
                IndexFormat::U16 => {
                    for &index in &submesh.indices {
                        bytes.extend_from_slice(&(index as u16).to_le_bytes());
                    }
                }
                IndexFormat::U32 => {
                    for &index in &submesh.indices {
                        bytes.extend_from_slice(&index.to_le_bytes());
                    }
                }
            }
            while bytes.len() % 4 != 0 {
                bytes.push(0);
            }
            ranges.push((offset, submesh.indices.len() as u32));
        }

        PackedIndices {
            format,
            bytes,
            ranges,
        }
    }

    /// A unit cube centered at the origin, one submesh, 36 indices.
    ///
    /// Each face has its own four vertices so normals stay flat.
    pub fn cube(texture: TextureId) -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        Self::new("cube", vertices).submesh(indices, texture)
    }

    /// A UV sphere of radius 0.5 centered at the origin.
    pub fn sphere(segments: u32, rings: u32, texture: TextureId) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];
                vertices.push(Vertex3d::new([x * 0.5, y * 0.5, z * 0.5], [x, y, z], uv));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self::new("sphere", vertices).submesh(indices, texture)
    }

    /// A square ground plane on XZ with normals pointing up.
    pub fn plane(size: f32, texture: TextureId) -> Self {
        let half = size * 0.5;
        let vertices = vec![
            Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];

        Self::new("plane", vertices).submesh(vec![0, 2, 1, 2, 0, 3], texture)
    }
}

/// One contiguous index range drawn with one set of textures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Submesh {
    pub index_buffer: BufferId,
    pub index_count: u32,
    pub index_format: IndexFormat,
    /// Byte offset of the first index within `index_buffer`.
    pub index_offset: u64,
    pub textures: SubmeshTextures,
}

/// GPU-resident geometry: a vertex buffer and its submeshes.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertex_buffer: BufferId,
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    pub fn new(vertex_buffer: BufferId) -> Self {
        Self {
            vertex_buffer,
            submeshes: Vec::new(),
        }
    }

    pub fn with_submesh(mut self, submesh: Submesh) -> Self {
        self.submeshes.push(submesh);
        self
    }

    /// Assemble a mesh from already-uploaded buffers and the packing used to fill them.
    pub fn from_packed(
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        data: &MeshData,
        packed: &PackedIndices,
    ) -> Self {
        let submeshes = data
            .submeshes
            .iter()
            .zip(&packed.ranges)
            .map(|(submesh, &(index_offset, index_count))| Submesh {
                index_buffer,
                index_count,
                index_format: packed.format,
                index_offset,
                textures: submesh.textures,
            })
            .collect();
        Self {
            vertex_buffer,
            submeshes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_thirty_six_indices() {
        let cube = MeshData::cube(TextureId(0));
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.submeshes.len(), 1);
        assert_eq!(cube.submeshes[0].indices.len(), 36);
        cube.validate().unwrap();
    }

    #[test]
    fn packing_aligns_submesh_offsets() {
        let data = MeshData::new(
            "two",
            vec![Vertex3d::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 4],
        )
        .submesh(vec![0, 1, 2], TextureId(0))
        .submesh(vec![2, 3, 0, 0, 1, 3], TextureId(1));

        let packed = data.pack_indices();
        assert_eq!(packed.format, IndexFormat::U16);
        // 3 u16 = 6 bytes, padded to 8
        assert_eq!(packed.ranges, vec![(0, 3), (8, 6)]);
        assert_eq!(packed.bytes.len(), 20);
        assert_eq!(&packed.bytes[8..10], &2u16.to_le_bytes());

        let mesh = Mesh::from_packed(BufferId(0), BufferId(1), &data, &packed);
        assert_eq!(mesh.submeshes[1].index_offset, 8);
        assert_eq!(mesh.submeshes[1].index_count, 6);
        assert_eq!(mesh.submeshes[1].textures.base_color, TextureId(1));
    }

    #[test]
    fn wide_meshes_use_u32() {
        assert_eq!(IndexFormat::for_vertex_count(65_536), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_537), IndexFormat::U32);
        assert_eq!(IndexFormat::U32.byte_width(), 4);
    }

    #[test]
    fn validation_catches_bad_data() {
        let empty = MeshData::new("empty", Vec::new());
        assert!(matches!(
            empty.validate(),
            Err(RenderError::MeshUpload { .. })
        ));

        let out_of_range = MeshData::new(
            "oob",
            vec![Vertex3d::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3],
        )
        .submesh(vec![0, 1, 3], TextureId(0));
        assert!(out_of_range.validate().is_err());

        let no_submeshes = MeshData::new(
            "bare",
            vec![Vertex3d::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3],
        );
        assert!(no_submeshes.validate().is_err());
    }

    #[test]
    fn primitives_wind_counter_clockwise() {
        use glam::Vec3;

        for data in [
            MeshData::cube(TextureId(0)),
            MeshData::sphere(12, 8, TextureId(0)),
            MeshData::plane(2.0, TextureId(0)),
        ] {
            let position = |i: u32| Vec3::from(data.vertices[i as usize].position);
            let normal = |i: u32| Vec3::from(data.vertices[i as usize].normal);
            for tri in data.submeshes[0].indices.chunks(3) {
                let face = (position(tri[1]) - position(tri[0]))
                    .cross(position(tri[2]) - position(tri[0]));
                // Degenerate slivers at the sphere poles have no facing.
                if face.length_squared() < 1e-8 {
                    continue;
                }
                let outward = normal(tri[0]) + normal(tri[1]) + normal(tri[2]);
                assert!(face.dot(outward) > 0.0, "{} has a back-facing triangle", data.label);
            }
        }
    }

    #[test]
    fn position_layout_drops_normals_and_uvs() {
        let cube = MeshData::cube(TextureId(0));
        assert_eq!(
            cube.vertex_bytes(VertexLayout::PositionNormalUv).len(),
            24 * 32
        );
        assert_eq!(cube.vertex_bytes(VertexLayout::Position).len(), 24 * 12);
    }
}
