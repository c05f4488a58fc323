//! Render driver: owns the program and per-mesh GPU buffers, uploads
//! transforms and issues the indexed draw.

use asset::{BoundingBox, IndexData, IndexWidth, MeshBuffers, analyze};
use corelib::{CameraState, Mat4, Projection};

use crate::backend::{
    BufferHandle, BufferKind, Frame, GeometryBinding, GraphicsBackend, ProgramDesc, ProgramHandle,
    UniformLocation,
};
use crate::error::{RenderError, RenderResult};

const VERTEX_SHADER: &str = include_str!("shaders/mesh.vert.wgsl");
const FRAGMENT_SHADER: &str = include_str!("shaders/mesh.frag.wgsl");

pub const CLEAR_COLOR: [f64; 4] = [0.9, 0.9, 0.9, 1.0];

/// Result of a successful mesh load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Framing {
    pub bounds: BoundingBox,
    /// Camera distance that keeps the whole mesh in view.
    pub distance: f32,
}

/// `2 * max extent`, or the default distance for empty or flat-point meshes.
pub fn framing_distance(bounds: &BoundingBox) -> f32 {
    let extent = bounds.max_extent();
    if bounds.is_empty() || extent <= 0.0 {
        return CameraState::DEFAULT_DISTANCE;
    }
    (extent * 2.0).max(CameraState::MIN_DISTANCE)
}

#[derive(Clone, Copy, Debug)]
struct Uniforms {
    projection: UniformLocation,
    view: UniformLocation,
    model: UniformLocation,
}

#[derive(Clone, Copy, Debug)]
struct GpuMesh {
    positions: BufferHandle,
    normals: BufferHandle,
    indices: BufferHandle,
    index_count: u32,
    index_width: IndexWidth,
}

/// Byte length of each uploaded channel.
#[derive(Clone, Copy, Debug)]
struct ChannelSizes {
    vertex_bytes: u64,
    index_bytes: u64,
    index_count: u32,
}

impl ChannelSizes {
    fn of(mesh: &MeshBuffers) -> RenderResult<Self> {
        let index_count = u32::try_from(mesh.indices.len()).map_err(|_| {
            RenderError::InvalidGeometry(format!(
                "{} indices exceed the 32-bit draw range",
                mesh.indices.len()
            ))
        })?;
        let vertex_bytes = (mesh.vertex_count() * std::mem::size_of::<[f32; 3]>()) as u64;
        let index_bytes = u64::from(index_count) * mesh.index_width().bytes() as u64;
        Ok(Self {
            vertex_bytes,
            index_bytes,
            index_count,
        })
    }

    fn check(&self, limit: u64) -> RenderResult<()> {
        let channels = [
            ("Mesh positions", self.vertex_bytes),
            ("Mesh normals", self.vertex_bytes),
            ("Mesh indices", self.index_bytes),
        ];
        match channels.into_iter().find(|&(_, size)| size > limit) {
            Some((label, size)) => Err(RenderError::BufferTooLarge { label, size, limit }),
            None => Ok(()),
        }
    }
}

pub struct RenderDriver<B: GraphicsBackend> {
    backend: B,
    program: Option<ProgramHandle>,
    uniforms: Uniforms,
    mesh: Option<GpuMesh>,
    projection: Projection,
}

impl<B: GraphicsBackend> RenderDriver<B> {
    /// Build the program and set initial transforms for a `width`x`height`
    /// surface. Shader or link failures abort construction.
    pub fn new(mut backend: B, width: u32, height: u32) -> RenderResult<Self> {
        let program = backend.create_program(&ProgramDesc {
            label: "Mesh",
            vertex_source: VERTEX_SHADER,
            fragment_source: FRAGMENT_SHADER,
            depth_test: true,
            cull_back_faces: true,
        })?;

        let lookup = |name: &'static str| {
            backend
                .uniform_location(program, name)
                .ok_or(RenderError::MissingUniform(name))
        };
        let uniforms = match (lookup("projection"), lookup("view"), lookup("model")) {
            (Ok(projection), Ok(view), Ok(model)) => Uniforms {
                projection,
                view,
                model,
            },
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                backend.release_program(program);
                return Err(e);
            }
        };

        let mut driver = Self {
            backend,
            program: Some(program),
            uniforms,
            mesh: None,
            projection: Projection::default(),
        };
        driver
            .backend
            .write_uniform(program, uniforms.model, &Mat4::IDENTITY);
        driver.set_view_transform(&CameraState::default().view());
        driver.resize(width, height);

        log::info!("Render driver ready ({}x{})", width.max(1), height.max(1));
        Ok(driver)
    }

    /// Replace the current mesh with `mesh`.
    ///
    /// Geometry, capability and buffer-size checks run before anything is
    /// released, so a rejected load leaves the previous mesh displayed. An empty mesh clears
    /// the previous one and draws nothing.
    pub fn load_mesh(&mut self, mesh: &MeshBuffers) -> RenderResult<Framing> {
        if self.program.is_none() {
            return Err(RenderError::Disposed);
        }

        let bounds = analyze(mesh);
        if !bounds.is_finite() {
            return Err(RenderError::InvalidGeometry(
                "vertex positions contain non-numeric values".into(),
            ));
        }
        if mesh.index_width() == IndexWidth::Wide && !self.backend.supports_wide_indices() {
            return Err(RenderError::CapabilityMissing(
                "32-bit indices (mesh has more than 65536 indices)",
            ));
        }

        let sizes = ChannelSizes::of(mesh)?;
        sizes.check(self.backend.max_buffer_size())?;

        self.release_mesh();

        let framing = Framing {
            bounds,
            distance: framing_distance(&bounds),
        };
        if !mesh.is_valid() {
            log::warn!("Mesh has no triangles; nothing to draw");
            return Ok(framing);
        }

        self.mesh = Some(self.upload(mesh)?);
        log::info!(
            "Mesh loaded: {} vertices, {} triangles, {:?} indices, framing distance {:.3}",
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.index_width(),
            framing.distance
        );
        Ok(framing)
    }

    fn upload(&mut self, mesh: &MeshBuffers) -> RenderResult<GpuMesh> {
        let positions = mesh.positions();
        let normals = mesh.normals();
        let index_bytes: &[u8] = match &mesh.indices {
            IndexData::Narrow(v) => bytemuck::cast_slice(v),
            IndexData::Wide(v) => bytemuck::cast_slice(v),
        };

        let positions = self.backend.create_buffer(
            BufferKind::Vertex,
            "Mesh positions",
            bytemuck::cast_slice(&positions),
        )?;
        let normals = match self.backend.create_buffer(
            BufferKind::Vertex,
            "Mesh normals",
            bytemuck::cast_slice(&normals),
        ) {
            Ok(b) => b,
            Err(e) => {
                self.backend.release_buffer(positions);
                return Err(e);
            }
        };
        let indices = match self
            .backend
            .create_buffer(BufferKind::Index, "Mesh indices", index_bytes)
        {
            Ok(b) => b,
            Err(e) => {
                self.backend.release_buffer(positions);
                self.backend.release_buffer(normals);
                return Err(e);
            }
        };

        Ok(GpuMesh {
            positions,
            normals,
            indices,
            index_count: ChannelSizes::of(mesh)?.index_count,
            index_width: mesh.index_width(),
        })
    }

    fn release_mesh(&mut self) {
        if let Some(mesh) = self.mesh.take() {
            self.backend.release_buffer(mesh.positions);
            self.backend.release_buffer(mesh.normals);
            self.backend.release_buffer(mesh.indices);
        }
    }

    /// Upload the view matrix. No geometry is touched.
    pub fn set_view_transform(&mut self, view: &Mat4) {
        if let Some(program) = self.program {
            self.backend.write_uniform(program, self.uniforms.view, view);
        }
    }

    /// Recompute the projection for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.program.is_none() {
            return;
        }
        let (width, height) = (width.max(1), height.max(1));
        self.backend.resize_surface(width, height);
        self.projection = self.projection.with_viewport(width, height);
        self.upload_projection();
    }

    fn upload_projection(&mut self) {
        if let Some(program) = self.program {
            let matrix = self.projection.matrix();
            self.backend
                .write_uniform(program, self.uniforms.projection, &matrix);
        }
    }

    /// Clear and draw the current mesh (clear only when there is none).
    pub fn draw(&mut self) -> RenderResult<()> {
        let program = self.program.ok_or(RenderError::Disposed)?;
        let geometry = self.mesh.map(|m| GeometryBinding {
            positions: m.positions,
            normals: m.normals,
            indices: m.indices,
            index_count: m.index_count,
            index_width: m.index_width,
        });
        self.backend.submit(&Frame {
            program,
            clear_color: CLEAR_COLOR,
            geometry,
        })
    }

    /// Release every GPU handle. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.release_mesh();
        if let Some(program) = self.program.take() {
            self.backend.release_program(program);
            log::info!("Render driver disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.program.is_none()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Index count of the current mesh, 0 without one.
    pub fn index_count(&self) -> u32 {
        self.mesh.map_or(0, |m| m.index_count)
    }

    pub fn index_width(&self) -> Option<IndexWidth> {
        self.mesh.map(|m| m.index_width)
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GraphicsBackend> Drop for RenderDriver<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
