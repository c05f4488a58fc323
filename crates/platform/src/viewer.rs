//! One viewing session: render driver, orbit controller and the loaded model.
//!
//! Windowing-agnostic, so the whole load/interact/draw cycle runs against any
//! [`GraphicsBackend`].

use std::path::Path;

use anyhow::{Context, Result};
use asset::{ModelSummary, ParsedObj, load_obj_from_path, parse_obj};
use corelib::{InputEvent, OrbitController, OrbitSettings};
use renderer::{GraphicsBackend, RenderDriver, RenderResult};

pub struct Viewer<B: GraphicsBackend> {
    driver: RenderDriver<B>,
    controller: OrbitController,
    summary: Option<ModelSummary>,
    listening: bool,
}

impl<B: GraphicsBackend> Viewer<B> {
    pub fn new(driver: RenderDriver<B>, settings: OrbitSettings) -> Self {
        let controller = OrbitController::new(Default::default(), settings);
        let mut viewer = Self {
            driver,
            controller,
            summary: None,
            listening: true,
        };
        viewer.upload_view();
        viewer
    }

    /// Read and load an OBJ file.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<ModelSummary> {
        let path = path.as_ref();
        let parsed = load_obj_from_path(path)?;
        self.show(parsed)
            .with_context(|| format!("failed to load {}", path.display()))
    }

    /// Parse OBJ text and replace the displayed mesh.
    pub fn load_source(&mut self, source: &str) -> Result<ModelSummary> {
        self.show(parse_obj(source))
    }

    /// Upload a parsed mesh and frame it.
    ///
    /// On error the previous mesh, camera and summary stay as they were.
    fn show(&mut self, parsed: ParsedObj) -> Result<ModelSummary> {
        if !parsed.diagnostics.is_empty() {
            log::warn!("{} parser diagnostic(s)", parsed.diagnostics.len());
        }

        let framing = self.driver.load_mesh(&parsed.mesh)?;
        self.controller.reset(framing.distance);
        self.upload_view();

        let summary = parsed.summary;
        log::info!(
            "Mesh loaded: {} vertices, {} indices ({:?}), framing distance {:.2}. {}",
            parsed.mesh.vertex_count(),
            parsed.mesh.indices.len(),
            parsed.mesh.index_width(),
            framing.distance,
            summary
        );
        self.summary = Some(summary);
        Ok(summary)
    }

    /// Feed one input event. Returns `true` when a redraw is needed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if !self.listening {
            return false;
        }
        let changed = self.controller.handle(event);
        if changed {
            self.upload_view();
        }
        changed
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.driver.resize(width, height);
    }

    pub fn draw(&mut self) -> RenderResult<()> {
        self.driver.draw()
    }

    /// Release GPU resources and stop reacting to input.
    pub fn dispose(&mut self) {
        self.listening = false;
        self.driver.dispose();
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn summary(&self) -> Option<ModelSummary> {
        self.summary
    }

    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    pub fn driver(&self) -> &RenderDriver<B> {
        &self.driver
    }

    fn upload_view(&mut self) {
        let view = self.controller.camera().view();
        self.driver.set_view_transform(&view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{CameraState, PointerButton, vec2};
    use renderer::{RecordingBackend, RenderError};

    const QUAD: &str = "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3 4\n";

    fn viewer() -> Viewer<RecordingBackend> {
        let driver = RenderDriver::new(RecordingBackend::new(), 640, 480).expect("driver");
        Viewer::new(driver, OrbitSettings::default())
    }

    #[test]
    fn load_frames_camera_and_reports_summary() {
        let mut v = viewer();
        let summary = v.load_source(QUAD).expect("load");
        assert_eq!(
            (summary.vertices, summary.faces, summary.triangles),
            (4, 1, 2)
        );
        assert_eq!(v.controller().camera().distance, 4.0);
        assert_eq!(v.driver().index_count(), 6);

        let last_view = *v.driver().backend().uniform_writes("view").last().expect("view");
        assert_eq!(last_view, CameraState::framed(4.0).view());
    }

    #[test]
    fn failed_load_keeps_previous_state() {
        let mut v = viewer();
        v.load_source(QUAD).expect("load");
        v.handle_input(&InputEvent::Wheel { delta: 100.0 });
        let camera = *v.controller().camera();

        let err = v.load_source("v 0 0 0\nv x 0 0\nv 0 1 0\nf 1 2 3").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::InvalidGeometry(_))
        ));
        assert_eq!(*v.controller().camera(), camera);
        assert_eq!(v.summary().map(|s| s.faces), Some(1));
        assert_eq!(v.driver().index_count(), 6);
    }

    #[test]
    fn camera_changes_upload_view() {
        let mut v = viewer();
        v.load_source(QUAD).expect("load");
        let writes = v.driver().backend().uniform_writes("view").len();

        assert!(!v.handle_input(&InputEvent::PointerDown {
            button: PointerButton::Primary,
            position: vec2(0.0, 0.0),
        }));
        assert!(v.handle_input(&InputEvent::PointerMove {
            position: vec2(5.0, 0.0),
        }));
        assert_eq!(
            v.driver().backend().uniform_writes("view").len(),
            writes + 1
        );
    }

    #[test]
    fn input_is_ignored_after_dispose() {
        let mut v = viewer();
        v.load_source(QUAD).expect("load");
        v.dispose();
        assert!(!v.is_listening());
        assert!(!v.handle_input(&InputEvent::Wheel { delta: 500.0 }));
        assert!(matches!(v.draw(), Err(RenderError::Disposed)));
        assert_eq!(v.driver().backend().live_buffers(), 0);
        v.dispose();
    }

    #[test]
    fn file_loads_through_asset_loader() {
        let path = std::env::temp_dir().join(format!("meshview-quad-{}.obj", std::process::id()));
        std::fs::write(&path, QUAD).expect("write");
        let mut v = viewer();
        let summary = v.load_path(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(summary.expect("load").triangles, 2);
        assert_eq!(v.driver().index_count(), 6);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let mut v = viewer();
        let err = v.load_path("/nonexistent/model.obj").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/model.obj"));
    }
}
