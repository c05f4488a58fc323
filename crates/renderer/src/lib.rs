//! Renderer: graphics capability contract, render driver and its wgpu backend.

pub mod backend;
pub mod driver;
pub mod error;
#[cfg(any(test, feature = "recording"))]
pub mod recording;
pub mod wgpu_backend;

pub use backend::{
    BufferHandle, BufferKind, Frame, GeometryBinding, GraphicsBackend, ProgramDesc, ProgramHandle,
    UniformLocation,
};
pub use driver::{CLEAR_COLOR, Framing, RenderDriver, framing_distance};
pub use error::{RenderError, RenderResult, ShaderStage};
#[cfg(any(test, feature = "recording"))]
pub use recording::RecordingBackend;
pub use wgpu_backend::WgpuBackend;
