//! Headless backend that records every call instead of touching a GPU.

use std::collections::BTreeMap;

use glam::Mat4;

use crate::backend::{
    BufferHandle, BufferKind, Frame, GraphicsBackend, ProgramDesc, ProgramHandle, UniformLocation,
};
use crate::error::{RenderError, RenderResult, ShaderStage};

const UNIFORM_NAMES: [&str; 3] = ["projection", "view", "model"];

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram(ProgramHandle),
    ReleaseProgram(ProgramHandle),
    CreateBuffer {
        handle: BufferHandle,
        kind: BufferKind,
        label: String,
        len: usize,
    },
    ReleaseBuffer(BufferHandle),
    WriteUniform {
        program: ProgramHandle,
        location: UniformLocation,
        value: Mat4,
    },
    ResizeSurface(u32, u32),
    Submit(Frame),
}

/// Raster state a program was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRecord {
    pub label: String,
    pub depth_test: bool,
    pub cull_back_faces: bool,
}

#[derive(Debug)]
pub struct RecordingBackend {
    /// Reported by [`GraphicsBackend::supports_wide_indices`].
    pub wide_indices: bool,
    /// Make program creation fail compiling this stage.
    pub fail_compile: Option<ShaderStage>,
    /// Make program creation fail at link time.
    pub fail_link: bool,
    /// Reported by [`GraphicsBackend::max_buffer_size`] and enforced on creation.
    pub max_buffer_size: u64,
    calls: Vec<Call>,
    programs: BTreeMap<u64, ProgramRecord>,
    programs_created: Vec<ProgramRecord>,
    buffers: BTreeMap<u64, usize>,
    surface_size: (u32, u32),
    next_handle: u64,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            wide_indices: true,
            fail_compile: None,
            fail_link: false,
            max_buffer_size: u64::MAX,
            calls: Vec::new(),
            programs: BTreeMap::new(),
            programs_created: Vec::new(),
            buffers: BTreeMap::new(),
            surface_size: (0, 0),
            next_handle: 1,
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn programs_created(&self) -> &[ProgramRecord] {
        &self.programs_created
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Byte sizes of live buffers, oldest first.
    pub fn buffer_sizes(&self) -> Vec<usize> {
        self.buffers.values().copied().collect()
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    /// Values written to the uniform called `name`, oldest first.
    pub fn uniform_writes(&self, name: &str) -> Vec<Mat4> {
        let Some(slot) = UNIFORM_NAMES.iter().position(|n| *n == name) else {
            return Vec::new();
        };
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::WriteUniform {
                    location, value, ..
                } if location.0 == slot as u64 => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Submit(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frames().last().copied()
    }

    fn next(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

impl GraphicsBackend for RecordingBackend {
    fn supports_wide_indices(&self) -> bool {
        self.wide_indices
    }

    fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        if let Some(stage) = self.fail_compile {
            return Err(RenderError::ShaderCompile {
                stage,
                log: "injected compile failure".into(),
            });
        }
        if self.fail_link {
            return Err(RenderError::ProgramLink("injected link failure".into()));
        }
        let handle = ProgramHandle(self.next());
        let record = ProgramRecord {
            label: desc.label.to_string(),
            depth_test: desc.depth_test,
            cull_back_faces: desc.cull_back_faces,
        };
        self.programs.insert(handle.0, record.clone());
        self.programs_created.push(record);
        self.calls.push(Call::CreateProgram(handle));
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains_key(&program.0) {
            return None;
        }
        UNIFORM_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|slot| UniformLocation(slot as u64))
    }

    fn write_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: &Mat4) {
        self.calls.push(Call::WriteUniform {
            program,
            location,
            value: *value,
        });
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[u8],
    ) -> RenderResult<BufferHandle> {
        if contents.len() as u64 > self.max_buffer_size {
            return Err(RenderError::BufferCreation {
                label: label.to_string(),
                reason: format!("{} bytes over limit {}", contents.len(), self.max_buffer_size),
            });
        }
        let handle = BufferHandle(self.next());
        self.buffers.insert(handle.0, contents.len());
        self.calls.push(Call::CreateBuffer {
            handle,
            kind,
            label: label.to_string(),
            len: contents.len(),
        });
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
        self.calls.push(Call::ReleaseBuffer(buffer));
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
        self.calls.push(Call::ReleaseProgram(program));
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
        self.calls.push(Call::ResizeSurface(width, height));
    }

    fn submit(&mut self, frame: &Frame) -> RenderResult<()> {
        if !self.programs.contains_key(&frame.program.0) {
            return Err(RenderError::InvalidHandle("program"));
        }
        if let Some(g) = frame.geometry {
            let known = [g.positions, g.normals, g.indices]
                .iter()
                .all(|b| self.buffers.contains_key(&b.0));
            if !known {
                return Err(RenderError::InvalidHandle("buffer"));
            }
        }
        self.calls.push(Call::Submit(*frame));
        Ok(())
    }
}
