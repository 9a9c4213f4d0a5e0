use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::bench::{ConvolutionKernel, GeometryBatch, QuadVertex};
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::GpuTexture;

// ── kernel uniform ────────────────────────────────────────────────────────

/// Uniform block consumed by `convolution.wgsl`.
///
/// Each kernel row occupies one `vec4` (`w` unused) so the array stride is 16
/// bytes as uniform layout rules require.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct KernelUniform {
    pub rows: [[f32; 4]; 3],
    pub divisor: f32,
    pub texel_step: f32,
    pub _pad: [f32; 2],
}

impl KernelUniform {
    pub fn new(kernel: &ConvolutionKernel, texel_step: f32) -> Self {
        let w = kernel.weights();
        Self {
            rows: [
                [w[0], w[1], w[2], 0.0],
                [w[3], w[4], w[5], 0.0],
                [w[6], w[7], w[8], 0.0],
            ],
            divisor: kernel.divisor(),
            texel_step,
            _pad: [0.0; 2],
        }
    }

    /// Weights as the shader reads them, in tap order.
    #[cfg(test)]
    pub fn weights(&self) -> [f32; 9] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }

    fn min_binding_size() -> std::num::NonZeroU64 {
        std::num::NonZeroU64::new(std::mem::size_of::<KernelUniform>() as u64)
            .expect("KernelUniform has non-zero size by construction")
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Draws the overdraw batch through the 3×3 convolution shader.
///
/// GPU resources are created lazily on the first `render` call and rebuilt only
/// when their inputs change (surface format, texture, batch size). Depth
/// testing and blending are disabled: each redraw overwrites the previous one,
/// so the visible image is that of a single pass.
pub struct ConvolutionRenderer {
    uniform: KernelUniform,
    uniform_dirty: bool,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    // bindings (rebuilt when the texture changes)
    bind_group: Option<wgpu::BindGroup>,
    kernel_ubo: Option<wgpu::Buffer>,
    texture: Option<GpuTexture>,
    texture_generation: u64,
    bind_group_generation: u64,

    // geometry
    quad_vbo: Option<wgpu::Buffer>,
    overdraw_ibo: Option<wgpu::Buffer>,
    index_count: u32,

    warned_no_texture: bool,
}

impl ConvolutionRenderer {
    /// `texel_step` is the UV distance between taps, normally `1 / side`.
    pub fn new(kernel: &ConvolutionKernel, texel_step: f32) -> Self {
        Self {
            uniform: KernelUniform::new(kernel, texel_step),
            uniform_dirty: true,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            kernel_ubo: None,
            texture: None,
            texture_generation: 0,
            bind_group_generation: u64::MAX,
            quad_vbo: None,
            overdraw_ibo: None,
            index_count: 0,
            warned_no_texture: false,
        }
    }

    /// Binds the source texture sampled by the fragment stage.
    pub fn set_texture(&mut self, texture: GpuTexture) {
        self.texture = Some(texture);
        self.texture_generation = self.texture_generation.wrapping_add(1);
    }

    /// Records one render pass drawing every index of `geometry`.
    ///
    /// Without a bound texture nothing is recorded.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        geometry: &GeometryBatch,
    ) {
        if self.texture.is_none() {
            if !self.warned_no_texture {
                log::debug!("ConvolutionRenderer: no texture bound; skipping draw");
                self.warned_no_texture = true;
            }
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_geometry(ctx, geometry);
        self.ensure_bindings(ctx);
        self.write_uniform(ctx);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(overdraw_ibo) = self.overdraw_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fillrate convolution pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_index_buffer(overdraw_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fillrate convolution shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/convolution.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fillrate convolution bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(KernelUniform::min_binding_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fillrate convolution pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fillrate convolution pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("convolution pipeline ready (format {:?})", ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.bind_group_generation = u64::MAX;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group_generation == self.texture_generation
            && self.bind_group.is_some()
            && self.kernel_ubo.is_some()
        {
            return;
        }

        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(texture) = self.texture.as_ref() else { return };

        let kernel_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fillrate kernel ubo"),
            size: std::mem::size_of::<KernelUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fillrate convolution bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: kernel_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(texture.sampler()),
                },
            ],
        });

        self.kernel_ubo = Some(kernel_ubo);
        self.bind_group = Some(bind_group);
        self.bind_group_generation = self.texture_generation;
        // Fresh buffer; contents must be re-uploaded.
        self.uniform_dirty = true;
    }

    fn ensure_geometry(&mut self, ctx: &RenderCtx<'_>, geometry: &GeometryBatch) {
        if self.quad_vbo.is_none() {
            self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fillrate quad vbo"),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            }));
        }

        if self.overdraw_ibo.is_some() && self.index_count == geometry.index_count() {
            return;
        }

        self.overdraw_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fillrate overdraw ibo"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.index_count = geometry.index_count();

        log::info!(
            "uploaded overdraw index buffer: {} indices ({} cycles)",
            self.index_count,
            geometry.cycles()
        );
    }

    fn write_uniform(&mut self, ctx: &RenderCtx<'_>) {
        if !self.uniform_dirty {
            return;
        }
        let Some(ubo) = self.kernel_ubo.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&self.uniform));
        self.uniform_dirty = false;
    }
}
