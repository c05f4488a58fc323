//! Startup configuration for the viewer window.

use std::path::PathBuf;

use corelib::OrbitSettings;

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub backends: wgpu::Backends,
    /// Initial inner size in physical pixels.
    pub width: u32,
    pub height: u32,
    /// OBJ file opened at startup. Without one the window starts empty.
    pub mesh_path: Option<PathBuf>,
    pub orbit: OrbitSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mesh_path: None,
            orbit: OrbitSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_mesh_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mesh_path = Some(path.into());
        self
    }

    /// Window title prefix; the model summary is appended once a mesh loads.
    pub fn title(&self) -> String {
        match self.mesh_path.as_ref().and_then(|p| p.file_name()) {
            Some(name) => format!("meshview - {}", name.to_string_lossy()),
            None => "meshview".to_string(),
        }
    }
}
