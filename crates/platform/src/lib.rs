//! Platform layer: window, event loop and the glue routing events into the viewer.
//!
//! - No busy loop: the loop waits and redraws only when something changed.
//! - Resize, close and dropped files are handled here; everything else is
//!   mapped to an [`corelib::InputEvent`] and handed to the [`Viewer`].

pub mod config;
pub mod input;
pub mod viewer;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use renderer::{RenderDriver, RenderError, WgpuBackend};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub use config::ViewerConfig;
pub use input::InputMapper;
pub use viewer::Viewer;

/// Open the viewer window and block until it is closed.
pub fn run_viewer(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;
    Ok(())
}

struct ViewerApp {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<WgpuBackend>>,
    input: InputMapper,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            window: None,
            viewer: None,
            input: InputMapper::new(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let backend = pollster::block_on(WgpuBackend::new(window.clone(), self.config.backends))
            .context("failed to initialize graphics context")?;
        let driver = RenderDriver::new(backend, size.width, size.height)
            .context("failed to build render pipeline")?;

        self.viewer = Some(Viewer::new(driver, self.config.orbit));
        self.window = Some(window);

        if let Some(path) = self.config.mesh_path.clone() {
            self.open(&path);
        }
        Ok(())
    }

    /// Load `path`; on failure the current mesh stays and the error is logged.
    fn open(&mut self, path: &Path) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        match viewer.load_path(path) {
            Ok(summary) => {
                self.config.mesh_path = Some(path.to_path_buf());
                if let Some(window) = &self.window {
                    window.set_title(&format!("{} | {}", self.config.title(), summary));
                    window.request_redraw();
                }
            }
            Err(e) => log::error!("{e:#}"),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{e:#}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                viewer.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Resized: {}x{}", size.width, size.height);
                viewer.resize(size.width, size.height);
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => match viewer.draw() {
                Ok(()) | Err(RenderError::Disposed) => {}
                Err(RenderError::SurfaceLost) => self.request_redraw(),
                Err(e) => log::error!("Draw failed: {e}"),
            },
            WindowEvent::DroppedFile(path) => {
                log::info!("File dropped: {}", path.display());
                self.open(&path);
            }
            other => {
                if let Some(input) = self.input.map(&other)
                    && viewer.handle_input(&input)
                {
                    self.request_redraw();
                }
            }
        }
    }
}
