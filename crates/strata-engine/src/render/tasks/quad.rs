use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::backend::{PipelineKey, WgpuBackend};
use crate::capability::CapabilityLevel;
use crate::task::RenderTask;

/// One axis-aligned quad in its layer's coordinate space.
///
/// `origin` is a corner; the quad spans `origin.xy .. origin.xy + size` at depth `origin.z`.
/// `color` is straight (non-premultiplied) linear RGBA.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub origin: Vec3,
    pub size: Vec2,
    pub color: [f32; 4],
}

impl Quad {
    pub fn new(origin: Vec3, size: Vec2, color: [f32; 4]) -> Self {
        Self {
            origin,
            size,
            color,
        }
    }

    /// Screen-space rectangle at depth 0, for HUD layers.
    pub fn screen(x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) -> Self {
        Self::new(Vec3::new(x, y, 0.0), Vec2::new(w, h), color)
    }
}

/// Draws a batch of solid quads in one instanced call.
///
/// Phases:
/// - `init_rendering` picks the pipeline matching the current raster state and
///   uploads the layer transform plus instance data
/// - `draw` records one render pass onto the frame target
/// - `cleanup_rendering` releases the per-frame buffers
pub struct QuadTask {
    quads: Vec<Quad>,
    front_face: wgpu::FrontFace,
    prepared: Option<Prepared>,
}

struct Prepared {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    instances: wgpu::Buffer,
    count: u32,
}

impl QuadTask {
    pub fn new(quads: Vec<Quad>) -> Self {
        Self {
            quads,
            front_face: wgpu::FrontFace::Ccw,
            prepared: None,
        }
    }

    /// Marks the quads as screen-space (+Y down).
    ///
    /// The HUD projection flips Y, which flips winding; this keeps culled
    /// layers from discarding the quads.
    pub fn screen_space(mut self) -> Self {
        self.front_face = wgpu::FrontFace::Cw;
        self
    }

    pub fn push(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    fn instances(&self) -> Vec<QuadInstance> {
        self.quads.iter().map(QuadInstance::from).collect()
    }
}

impl RenderTask<WgpuBackend> for QuadTask {
    fn init_rendering(
        &mut self,
        backend: &mut WgpuBackend,
        _capability: CapabilityLevel,
        transform: &Mat4,
    ) -> Result<()> {
        if self.quads.is_empty() {
            return Ok(());
        }

        let count = instance_count(self.quads.len())?;

        let raster = backend.raster_state();
        let key = PipelineKey {
            label: "strata quad pipeline",
            format: backend.surface_format(),
            raster,
            front_face: self.front_face,
        };
        let pipeline = backend.pipeline(key, build_pipeline);

        let globals = QuadGlobals {
            mvp: transform.to_cols_array_2d(),
            params: [raster.alpha_cutoff(), 0.0, 0.0, 0.0],
        };

        let device = backend.device();
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("strata quad globals"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("strata quad instances"),
            contents: bytemuck::cast_slice(&self.instances()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata quad bind group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        self.prepared = Some(Prepared {
            pipeline,
            bind_group,
            instances,
            count,
        });

        Ok(())
    }

    fn draw(&mut self, backend: &mut WgpuBackend, _capability: CapabilityLevel) -> Result<()> {
        let Some(prepared) = self.prepared.as_ref() else {
            return Ok(());
        };

        let target = backend.target_mut()?;
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("strata quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
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

        rpass.set_pipeline(&prepared.pipeline);
        rpass.set_bind_group(0, &prepared.bind_group, &[]);
        rpass.set_vertex_buffer(0, prepared.instances.slice(..));
        rpass.draw(0..6, 0..prepared.count);

        Ok(())
    }

    fn cleanup_rendering(
        &mut self,
        _backend: &mut WgpuBackend,
        _capability: CapabilityLevel,
    ) -> Result<()> {
        self.prepared = None;
        Ok(())
    }
}

fn instance_count(len: usize) -> Result<u32> {
    u32::try_from(len).with_context(|| format!("{len} quads exceed one instanced draw"))
}

fn build_pipeline(device: &wgpu::Device, key: &PipelineKey) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("strata quad shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(key.label),
        // Derived from the shader; the bind group layout comes back out via
        // `get_bind_group_layout(0)`.
        layout: None,

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadInstance::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: key.raster.blend_state(),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: key.front_face,
            cull_mode: key.raster.cull_mode(),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadGlobals {
    mvp: [[f32; 4]; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct QuadInstance {
    origin: [f32; 3],
    size: [f32; 2],
    color: [f32; 4],
}

impl QuadInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // origin
        1 => Float32x2, // size
        2 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&Quad> for QuadInstance {
    fn from(q: &Quad) -> Self {
        Self {
            origin: q.origin.to_array(),
            size: q.size.to_array(),
            color: q.color,
        }
    }
}
