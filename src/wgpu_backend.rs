//! The wgpu implementation of [`RenderBackend`].
//!
//! [`WgpuBackend`] owns every GPU object the scene refers to by handle and replays a
//! frame's [`RenderCommand`]s onto a single render pass.
//!
//! # Bind groups
//!
//! - **Group 0**: frame uniforms (camera position, light count) and the light array
//! - **Group 1**: per-model uniforms, one dynamic-offset slot per model
//! - **Group 2**: base-color texture and sampler, created once per texture
//!
//! Every pipeline shares this layout, so group 0 stays bound across pipeline
//! switches. Position-only pipelines simply ignore groups 0 and 2.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::backend::RenderBackend;
use crate::commands::{FragmentUniforms, RenderCommand, TextureSlot, Uniforms};
use crate::error::RenderError;
use crate::gpu::{GpuContext, SurfaceErrorAction};
use crate::handles::{BufferId, PipelineId, TextureId};
use crate::light::GpuLight;
use crate::lighting::MAX_LIGHTS;
use crate::mesh::{Mesh, MeshData};
use crate::pipeline::{DepthState, PipelineConfig, ShaderLibrary, VertexLayout};
use crate::texture::Texture;

const UNIFORMS_SIZE: u64 = std::mem::size_of::<Uniforms>() as u64;
const INITIAL_MODEL_SLOTS: usize = 16;

/// Round `size` up to a multiple of `alignment`.
fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Capacity to grow to so that `required` slots fit.
fn grown_capacity(current: usize, required: usize) -> usize {
    if required <= current {
        current
    } else {
        required.next_power_of_two()
    }
}

struct TextureEntry {
    #[allow(dead_code)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Buffers, textures and pipelines addressed by handle.
#[derive(Default)]
struct GpuResources {
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<TextureEntry>,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl GpuResources {
    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        let buffer = self.buffers.get(id.index());
        if buffer.is_none() {
            log::warn!("unknown buffer {id:?}");
        }
        buffer
    }

    fn texture(&self, id: TextureId) -> Option<&TextureEntry> {
        let texture = self.textures.get(id.index());
        if texture.is_none() {
            log::warn!("unknown texture {id:?}");
        }
        texture
    }

    fn pipeline(&self, id: PipelineId) -> Option<&wgpu::RenderPipeline> {
        let pipeline = self.pipelines.get(id.index());
        if pipeline.is_none() {
            log::warn!("unknown pipeline {id:?}");
        }
        pipeline
    }
}

/// Per-model uniforms, one aligned slot per model.
struct ModelUniformBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl ModelUniformBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(UNIFORMS_SIZE, alignment);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORMS_SIZE),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    /// Make room for `slots` models. Only reallocates when the scene outgrows the buffer.
    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        slots: usize,
    ) {
        let capacity = grown_capacity(self.capacity, slots);
        if capacity != self.capacity {
            log::debug!(
                "growing model uniform buffer from {} to {} slots",
                self.capacity,
                capacity
            );
            *self = Self::new(device, layout, capacity);
        }
    }

    fn offset(&self, slot: u32) -> u64 {
        slot as u64 * self.stride
    }
}

/// Depth attachment sized to the surface.
struct DepthTarget {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(gpu: &GpuContext) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DepthState::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Renders frames through wgpu onto a window surface.
///
/// # Example
///
/// ```ignore
/// let mut backend = WgpuBackend::new(GpuContext::new(window)?);
/// let lit = backend.create_pipeline(&PipelineConfig::lit())?;
/// let checker = backend.add_texture(Texture::checker(backend.gpu(), 256, 8));
/// let cube = backend.upload_mesh(&MeshData::cube(checker), VertexLayout::PositionNormalUv)?;
/// ```
pub struct WgpuBackend {
    gpu: GpuContext,
    library: ShaderLibrary,
    resources: GpuResources,
    model_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    frame_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    model_uniforms: ModelUniformBuffer,
    depth: DepthTarget,
    /// Depth state baked into every pipeline.
    depth_state: DepthState,
    fatal: bool,
}

impl WgpuBackend {
    /// Build the backend with the built-in shader library.
    pub fn new(gpu: GpuContext) -> Self {
        let library = ShaderLibrary::with_builtins(&gpu.device);
        Self::with_library(gpu, library)
    }

    pub fn with_library(gpu: GpuContext, library: ShaderLibrary) -> Self {
        let device = &gpu.device;

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT, false),
            ],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                true,
            )],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Fragment Uniforms"),
            size: std::mem::size_of::<FragmentUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights"),
            contents: bytemuck::cast_slice(&[GpuLight::default(); MAX_LIGHTS]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let model_uniforms = ModelUniformBuffer::new(device, &model_layout, INITIAL_MODEL_SLOTS);
        let depth = DepthTarget::new(&gpu);

        Self {
            gpu,
            library,
            resources: GpuResources::default(),
            model_layout,
            texture_layout,
            pipeline_layout,
            frame_buffer,
            light_buffer,
            frame_bind_group,
            model_uniforms,
            depth,
            depth_state: DepthState::LESS_WRITE,
            fatal: false,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Set when the surface hit an unrecoverable error. The host should shut down.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Build a render pipeline from a named shader pair.
    ///
    /// Validation runs inside an error scope so a rejected descriptor surfaces here
    /// as [`RenderError::PipelineCreation`] instead of at the first draw.
    pub fn create_pipeline(&mut self, config: &PipelineConfig) -> Result<PipelineId, RenderError> {
        let vertex = self.library.function(&config.vertex_function)?;
        let fragment = self.library.function(&config.fragment_function)?;
        let device = &self.gpu.device;

        if config.wireframe && !device.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            return Err(RenderError::PipelineCreation {
                label: config.label.clone(),
                message: "wireframe needs POLYGON_MODE_LINE, which this adapter lacks".to_string(),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(&vertex.entry_point),
                buffers: &[config.vertex_layout.buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(&fragment.entry_point),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: config.primitive_state(),
            depth_stencil: Some(self.depth_state.to_wgpu()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineCreation {
                label: config.label.clone(),
                message: error.to_string(),
            });
        }

        log::info!(
            "created pipeline '{}' ({} / {})",
            config.label,
            config.vertex_function,
            config.fragment_function
        );
        self.resources.pipelines.push(pipeline);
        Ok(PipelineId(self.resources.pipelines.len() - 1))
    }

    /// Register a texture. Its bind group is built once here, not per draw.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let bind_group = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Texture Bind Group"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            });
        self.resources.textures.push(TextureEntry {
            texture,
            bind_group,
        });
        TextureId(self.resources.textures.len() - 1)
    }

    /// Convert CPU geometry into GPU buffers.
    ///
    /// Creates one vertex buffer laid out for `layout` and one index buffer shared by
    /// all submeshes.
    pub fn upload_mesh(
        &mut self,
        data: &MeshData,
        layout: VertexLayout,
    ) -> Result<Mesh, RenderError> {
        data.validate()?;
        for submesh in &data.submeshes {
            let texture = submesh.textures.base_color;
            if texture.index() >= self.resources.textures.len() {
                return Err(RenderError::MeshUpload {
                    label: data.label.clone(),
                    reason: format!("unknown texture {texture:?}"),
                });
            }
        }

        let packed = data.pack_indices();
        let device = &self.gpu.device;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", data.label)),
            contents: &data.vertex_bytes(layout),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", data.label)),
            contents: &packed.bytes,
            usage: wgpu::BufferUsages::INDEX,
        });

        let vertex_id = self.push_buffer(vertex_buffer);
        let index_id = self.push_buffer(index_buffer);

        log::info!(
            "uploaded mesh '{}': {} vertices, {} submeshes, {:?} indices",
            data.label,
            data.vertices.len(),
            data.submeshes.len(),
            packed.format
        );
        Ok(Mesh::from_packed(vertex_id, index_id, data, &packed))
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer) -> BufferId {
        self.resources.buffers.push(buffer);
        BufferId(self.resources.buffers.len() - 1)
    }

    /// Upload the frame's uniforms before any pass is recorded.
    fn write_uniforms(&mut self, commands: &[RenderCommand]) {
        let slots = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BindModelUniforms { slot, .. } => Some(*slot as usize + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        self.model_uniforms
            .ensure_capacity(&self.gpu.device, &self.model_layout, slots);

        let queue = &self.gpu.queue;
        for command in commands {
            match command {
                RenderCommand::BindFrameUniforms { fragment, lights } => {
                    queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(fragment));
                    queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&lights.lights));
                }
                RenderCommand::BindModelUniforms { slot, uniforms } => {
                    queue.write_buffer(
                        &self.model_uniforms.buffer,
                        self.model_uniforms.offset(*slot),
                        bytemuck::bytes_of(uniforms),
                    );
                }
                _ => {}
            }
        }
    }

    /// Replay one in-pass command.
    fn record(&self, pass: &mut wgpu::RenderPass<'_>, command: &RenderCommand) {
        match command {
            RenderCommand::BindFrameUniforms { .. } => {
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
            }
            RenderCommand::BindModelUniforms { slot, .. } => {
                let offset = self.model_uniforms.offset(*slot) as wgpu::DynamicOffset;
                pass.set_bind_group(1, &self.model_uniforms.bind_group, &[offset]);
            }
            RenderCommand::BindPipeline(id) => {
                if let Some(pipeline) = self.resources.pipeline(*id) {
                    pass.set_pipeline(pipeline);
                }
            }
            RenderCommand::BindVertexBuffer(id) => {
                if let Some(buffer) = self.resources.buffer(*id) {
                    pass.set_vertex_buffer(0, buffer.slice(..));
                }
            }
            RenderCommand::BindTexture {
                slot: TextureSlot::BaseColor,
                texture,
            } => {
                if let Some(entry) = self.resources.texture(*texture) {
                    pass.set_bind_group(2, &entry.bind_group, &[]);
                }
            }
            RenderCommand::DrawIndexed {
                index_buffer,
                index_count,
                index_format,
                index_offset,
            } => {
                if let Some(buffer) = self.resources.buffer(*index_buffer) {
                    pass.set_index_buffer(buffer.slice(*index_offset..), index_format.to_wgpu());
                    pass.draw_indexed(0..*index_count, 0, 0..1);
                }
            }
            RenderCommand::BeginPass { .. }
            | RenderCommand::BindDepthStencil(_)
            | RenderCommand::EndPass
            | RenderCommand::Present => {}
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Drawable = wgpu::SurfaceTexture;

    fn acquire_drawable(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(err) => {
                match self.gpu.handle_surface_error(err.clone()) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::trace!("skipping frame: {err}");
                    }
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface out of memory, skipping frame");
                        self.fatal = true;
                    }
                }
                None
            }
        }
    }

    fn submit(&mut self, drawable: wgpu::SurfaceTexture, commands: &[RenderCommand]) {
        self.write_uniforms(commands);

        let view = drawable
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = Some(self.gpu.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            },
        ));
        let mut drawable = Some(drawable);
        let mut pass: Option<wgpu::RenderPass<'static>> = None;

        for command in commands {
            match command {
                RenderCommand::BeginPass {
                    clear_color,
                    clear_depth,
                } => {
                    let Some(encoder) = encoder.as_mut() else {
                        continue;
                    };
                    let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color.to_wgpu()),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(*clear_depth),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    pass = Some(render_pass.forget_lifetime());
                }
                RenderCommand::BindDepthStencil(state) => {
                    // wgpu bakes depth state into the pipeline
                    if *state != self.depth_state {
                        log::warn!(
                            "requested depth state {state:?} differs from pipeline state {:?}",
                            self.depth_state
                        );
                    }
                }
                RenderCommand::EndPass => {
                    pass = None;
                }
                RenderCommand::Present => {
                    pass = None;
                    if let Some(encoder) = encoder.take() {
                        self.gpu.queue.submit(std::iter::once(encoder.finish()));
                    }
                    if let Some(drawable) = drawable.take() {
                        drawable.present();
                    }
                }
                other => match pass.as_mut() {
                    Some(pass) => self.record(pass, other),
                    None => log::warn!("{other:?} issued outside a render pass"),
                },
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            self.depth = DepthTarget::new(&self.gpu);
        }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    has_dynamic_offset: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_slots_respect_offset_alignment() {
        assert_eq!(aligned_stride(UNIFORMS_SIZE, 256), 256);
        assert_eq!(aligned_stride(UNIFORMS_SIZE, 64), 256);
        assert_eq!(aligned_stride(UNIFORMS_SIZE, 16), 240);
        assert_eq!(aligned_stride(257, 256), 512);
    }

    #[test]
    fn model_buffer_grows_only_past_capacity() {
        assert_eq!(grown_capacity(16, 0), 16);
        assert_eq!(grown_capacity(16, 16), 16);
        assert_eq!(grown_capacity(16, 17), 32);
        assert_eq!(grown_capacity(32, 100), 128);
    }
}
