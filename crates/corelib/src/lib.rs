//! Core types: math re-exports, orbit camera state, input state machine.

pub use glam::{Mat4, Vec2, Vec3, Vec4, vec2, vec3};

pub mod camera;
pub mod gesture;

pub use camera::{CameraState, Projection};
pub use gesture::{Gesture, InputEvent, OrbitController, OrbitSettings, PointerButton, TouchPhase};

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn default_view_looks_down_negative_z() {
        let cam = CameraState::framed(4.0);
        let m = cam.view().to_cols_array();
        assert!((m[14] + 4.0).abs() < 1e-6);
        assert!((m[0] - 1.0).abs() < 1e-6);
        assert!((m[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn view_rotates_before_translating() {
        let cam = CameraState {
            distance: 3.0,
            rotation_x: 0.0,
            rotation_y: std::f32::consts::FRAC_PI_2,
            pan_x: 0.5,
            pan_y: -0.5,
        };
        // +X rotates onto -Z about Y, then gets panned and pushed back.
        let p = cam.view().transform_point3(Vec3::X);
        assert!(approx(p, vec3(0.5, -0.5, -4.0)), "{p:?}");
    }

    #[test]
    fn view_composes_rotate_x_outside_rotate_y() {
        let cam = CameraState {
            distance: 1.0,
            rotation_x: 0.3,
            rotation_y: 1.1,
            pan_x: 0.0,
            pan_y: 0.0,
        };
        let expected = Mat4::from_translation(vec3(0.0, 0.0, -1.0))
            * Mat4::from_rotation_x(0.3)
            * Mat4::from_rotation_y(1.1);
        let p = vec3(0.2, 0.7, -0.4);
        assert!(approx(cam.view().transform_point3(p), expected.transform_point3(p)));
    }

    #[test]
    fn framing_clamps_small_distances() {
        assert_eq!(CameraState::framed(0.25).distance, CameraState::MIN_DISTANCE);
        let mut cam = CameraState::framed(2.0);
        cam.dolly(-10.0);
        assert_eq!(cam.distance, 1.0);
    }

    #[test]
    fn projection_is_finite_for_degenerate_viewports() {
        for (w, h) in [(0, 0), (1920, 0), (0, 1080), (800, 600)] {
            let proj = Projection::default().with_viewport(w, h);
            assert!(proj.matrix().to_cols_array().iter().all(|f| f.is_finite()));
        }
    }

    #[test]
    fn projection_uses_aspect() {
        let proj = Projection::default().with_viewport(1600, 800);
        assert!((proj.aspect - 2.0).abs() < 1e-6);
        let m = proj.matrix().to_cols_array();
        assert!((m[5] / m[0] - 2.0).abs() < 1e-4);
    }
}
