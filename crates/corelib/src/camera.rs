use crate::{Mat4, vec3};

/// Orbit camera parameters driven by user input.
///
/// `distance` never drops below [`CameraState::MIN_DISTANCE`]; the rotation
/// angles are unbounded radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl CameraState {
    pub const MIN_DISTANCE: f32 = 1.0;
    /// Framing used when a mesh gives nothing to measure.
    pub const DEFAULT_DISTANCE: f32 = 5.0;

    /// Unrotated, unpanned camera at `distance` from the origin.
    pub fn framed(distance: f32) -> Self {
        Self {
            distance: distance.max(Self::MIN_DISTANCE),
            rotation_x: 0.0,
            rotation_y: 0.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Move along the view axis, clamped to the minimum distance.
    #[inline]
    pub fn dolly(&mut self, delta: f32) {
        self.distance = (self.distance + delta).max(Self::MIN_DISTANCE);
    }

    /// `translate(pan_x, pan_y, -distance) * rotate_x * rotate_y`.
    ///
    /// Pan and zoom act in view space after the rotation, so the mesh orbits
    /// around its own origin.
    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(vec3(self.pan_x, self.pan_y, -self.distance))
            * Mat4::from_rotation_x(self.rotation_x)
            * Mat4::from_rotation_y(self.rotation_y)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::framed(Self::DEFAULT_DISTANCE)
    }
}

/// Perspective projection (right-handed, depth in `[0, 1]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Projection {
    pub fn new(fov_y_rad: f32, z_near: f32, z_far: f32, aspect: f32) -> Self {
        Self {
            fov_y_rad,
            z_near,
            z_far,
            aspect,
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Aspect ratio for a viewport; zero dimensions count as one pixel.
    #[inline]
    pub fn with_viewport(self, width: u32, height: u32) -> Self {
        self.with_aspect(width.max(1) as f32 / height.max(1) as f32)
    }
}

impl Default for Projection {
    /// 80 degree vertical field of view, near 0.1, far 1000.
    fn default() -> Self {
        Self::new(80f32.to_radians(), 0.1, 1000.0, 1.0)
    }
}
