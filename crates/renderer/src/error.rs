use std::fmt;

use thiserror::Error;

/// Programmable pipeline stage, for compile diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No graphics context available: {0}")]
    NoContext(String),
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("Failed to link program: {0}")]
    ProgramLink(String),
    #[error("Program has no uniform named '{0}'")]
    MissingUniform(&'static str),
    #[error("Graphics context lacks required capability: {0}")]
    CapabilityMissing(&'static str),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Buffer '{label}' needs {size} bytes, device limit is {limit}")]
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },
    #[error("Failed to create buffer '{label}': {reason}")]
    BufferCreation { label: String, reason: String },
    #[error("Unknown {0} handle")]
    InvalidHandle(&'static str),
    #[error("Surface lost")]
    SurfaceLost,
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Render driver has been disposed")]
    Disposed,
}

pub type RenderResult<T> = Result<T, RenderError>;
