//! Graphics capability contract the render driver is written against.
//!
//! [`crate::WgpuBackend`] implements it on a real device; the recording
//! backend implements it headlessly for tests.

use asset::IndexWidth;
use glam::Mat4;

use crate::error::RenderResult;

/// Handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a linked program (shaders + fixed-function state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u64);

/// Location of a uniform inside a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Program sources plus the raster state baked into it.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub depth_test: bool,
    pub cull_back_faces: bool,
}

/// Buffers bound for one indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBinding {
    pub positions: BufferHandle,
    pub normals: BufferHandle,
    pub indices: BufferHandle,
    pub index_count: u32,
    pub index_width: IndexWidth,
}

/// One frame: clear colour and depth, then draw `geometry` if present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub program: ProgramHandle,
    pub clear_color: [f64; 4],
    pub geometry: Option<GeometryBinding>,
}

pub trait GraphicsBackend {
    /// Whether 32-bit index draws over the full index range are supported.
    fn supports_wide_indices(&self) -> bool;

    /// Largest buffer, in bytes, [`GraphicsBackend::create_buffer`] accepts.
    fn max_buffer_size(&self) -> u64;

    /// Compile both stages and link them. Errors name the failing step.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle>;

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn write_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: &Mat4);

    /// Immutable buffer initialized with `contents`.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[u8],
    ) -> RenderResult<BufferHandle>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_program(&mut self, program: ProgramHandle);

    /// Drawing surface changed pixel size.
    fn resize_surface(&mut self, width: u32, height: u32);

    fn submit(&mut self, frame: &Frame) -> RenderResult<()>;
}
