//! wgpu implementation of [`GraphicsBackend`]: surface, depth buffer,
//! one pipeline per program, static vertex/index buffers.
//! wgpu = 26.x, winit = 0.30.x

use std::collections::HashMap;
use std::sync::Arc;

use asset::IndexWidth;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendState, Buffer,
    BufferBindingType, BufferUsages, ColorTargetState, ColorWrites, CommandEncoderDescriptor,
    DepthBiasState, DepthStencilState, Device, DeviceDescriptor, DownlevelFlags, ErrorFilter,
    Extent3d, Features, FragmentState, IndexFormat, Instance, InstanceDescriptor, Limits, LoadOp,
    Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexBufferLayout, VertexState,
    VertexStepMode, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::backend::{
    BufferHandle, BufferKind, Frame, GraphicsBackend, ProgramDesc, ProgramHandle, UniformLocation,
};
use crate::error::{RenderError, RenderResult, ShaderStage};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const POSITION_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

const NORMAL_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![1 => Float32x3],
};

/// Uniform block shared by both shader stages (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MeshUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

/// Byte offset of each matrix inside [`MeshUniforms`].
const UNIFORM_OFFSETS: [(&str, u64); 3] = [("projection", 0), ("view", 64), ("model", 128)];

struct GpuProgram {
    pipeline: RenderPipeline,
    uniform_buf: Buffer,
    bind_group: BindGroup,
}

pub struct WgpuBackend {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,
    wide_indices: bool,

    // Depth
    depth_view: TextureView,

    programs: HashMap<ProgramHandle, GpuProgram>,
    buffers: HashMap<BufferHandle, Buffer>,
    next_handle: u64,
}

impl WgpuBackend {
    /// Create a device and surface bound to `window`.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> RenderResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window)
            .map_err(|e| RenderError::NoContext(format!("create_surface failed: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::NoContext(format!("No suitable GPU adapter: {e}")))?;

        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let wide_indices = adapter
            .get_downlevel_capabilities()
            .flags
            .contains(DownlevelFlags::FULL_DRAW_INDEX_UINT32);
        if !wide_indices {
            log::warn!("Adapter lacks full 32-bit index support; large meshes will be refused");
        }

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Meshview Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::NoContext(format!("request_device failed: {e}")))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = caps.formats.first() else {
            return Err(RenderError::NoContext(
                "surface is not supported by the adapter".into(),
            ));
        };
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(fallback_format);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            wide_indices,
            depth_view,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            next_handle: 1,
        })
    }

    fn next(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    /// Compile one stage inside a validation scope so errors come back as
    /// values instead of reaching the uncaptured-error handler.
    fn compile(&self, stage: ShaderStage, label: &str, source: &str) -> RenderResult<ShaderModule> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompile {
                stage,
                log: err.to_string(),
            }),
            None => Ok(module),
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }
}

impl GraphicsBackend for WgpuBackend {
    fn supports_wide_indices(&self) -> bool {
        self.wide_indices
    }

    fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        let vs = self.compile(ShaderStage::Vertex, desc.label, desc.vertex_source)?;
        let fs = self.compile(ShaderStage::Fragment, desc.label, desc.fragment_source)?;

        self.device.push_error_scope(ErrorFilter::Validation);

        let bgl = self.device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Mesh BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<MeshUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let identity = Mat4::IDENTITY.to_cols_array_2d();
        let uniform_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh UBO"),
                contents: bytemuck::bytes_of(&MeshUniforms {
                    projection: identity,
                    view: identity,
                    model: identity,
                }),
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh BG"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("Mesh PipelineLayout"),
                bind_group_layouts: &[&bgl],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: &vs,
                    entry_point: Some("vs_main"),
                    buffers: &[POSITION_LAYOUT, NORMAL_LAYOUT],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: &fs,
                    entry_point: Some("fs_main"),
                    targets: &[Some(ColorTargetState {
                        format: self.surface_config.format,
                        blend: Some(BlendState::REPLACE),
                        write_mask: ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    cull_mode: desc.cull_back_faces.then_some(wgpu::Face::Back),
                    ..Default::default()
                },
                // The pass always carries a depth attachment, so "no depth
                // test" is expressed as an always-pass compare.
                depth_stencil: Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: desc.depth_test,
                    depth_compare: if desc.depth_test {
                        wgpu::CompareFunction::LessEqual
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: wgpu::StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            uniform_buf.destroy();
            return Err(RenderError::ProgramLink(err.to_string()));
        }

        let handle = ProgramHandle(self.next());
        self.programs.insert(
            handle,
            GpuProgram {
                pipeline,
                uniform_buf,
                bind_group,
            },
        );
        log::debug!("Created program '{}' ({:?})", desc.label, handle);
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        UNIFORM_OFFSETS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, offset)| UniformLocation(offset))
    }

    fn write_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: &Mat4) {
        let Some(p) = self.programs.get(&program) else {
            log::warn!("Uniform write to unknown program {:?}", program);
            return;
        };
        self.queue.write_buffer(
            &p.uniform_buf,
            location.0,
            bytemuck::bytes_of(&value.to_cols_array_2d()),
        );
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[u8],
    ) -> RenderResult<BufferHandle> {
        let usage = match kind {
            BufferKind::Vertex => BufferUsages::VERTEX,
            BufferKind::Index => BufferUsages::INDEX,
        };
        // Scopes nest: the validation scope is popped first.
        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(oom) {
            buffer.destroy();
            return Err(RenderError::BufferCreation {
                label: label.to_string(),
                reason: err.to_string(),
            });
        }

        let handle = BufferHandle(self.next());
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buf) = self.buffers.remove(&buffer) {
            buf.destroy();
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if let Some(p) = self.programs.remove(&program) {
            p.uniform_buf.destroy();
        }
    }

    /// Resize: reconfigure surface & recreate depth view.
    fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.reconfigure();
    }

    fn submit(&mut self, frame: &Frame) -> RenderResult<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) if is_surface_lost(&err) => {
                log::warn!("Surface {:?}; reconfiguring", err);
                self.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(err) => return Err(RenderError::Surface(err.to_string())),
        };
        let program = self
            .programs
            .get(&frame.program)
            .ok_or(RenderError::InvalidHandle("program"))?;
        let geometry = match frame.geometry {
            Some(g) => {
                let lookup = |h: BufferHandle| {
                    self.buffers
                        .get(&h)
                        .ok_or(RenderError::InvalidHandle("buffer"))
                };
                Some((
                    lookup(g.positions)?,
                    lookup(g.normals)?,
                    lookup(g.indices)?,
                    g.index_count,
                    index_format(g.index_width),
                ))
            }
            None => None,
        };

        let view = output.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color;
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some((positions, normals, indices, index_count, format)) = geometry {
                rpass.set_pipeline(&program.pipeline);
                rpass.set_bind_group(0, &program.bind_group, &[]);
                rpass.set_vertex_buffer(0, positions.slice(..));
                rpass.set_vertex_buffer(1, normals.slice(..));
                rpass.set_index_buffer(indices.slice(..), format);
                rpass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn index_format(width: IndexWidth) -> IndexFormat {
    match width {
        IndexWidth::Narrow => IndexFormat::Uint16,
        IndexWidth::Wide => IndexFormat::Uint32,
    }
}

fn is_surface_lost(err: &SurfaceError) -> bool {
    matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_offsets_match_block_layout() {
        assert_eq!(std::mem::size_of::<MeshUniforms>(), 192);
        assert_eq!(UNIFORM_OFFSETS.map(|(_, o)| o), [0, 64, 128]);
    }

    #[test]
    fn index_widths_map_to_formats() {
        assert_eq!(index_format(IndexWidth::Narrow), IndexFormat::Uint16);
        assert_eq!(index_format(IndexWidth::Wide), IndexFormat::Uint32);
    }
}
