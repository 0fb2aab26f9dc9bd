//! Look-at camera used by the full projection model.

use glam::Vec3;

use crate::config::{DEFAULT_FAR, DEFAULT_FOV, DEFAULT_NEAR};
use crate::error::ProjectionError;

/// Smallest field of view (degrees) a setter will accept.
pub const MIN_FOV: f32 = 1.0;
/// Largest field of view (degrees) a setter will accept.
pub const MAX_FOV: f32 = 179.0;
/// Smallest near-plane distance a setter will accept.
pub const MIN_NEAR: f32 = 1e-3;

/// Below this length a basis vector counts as zero.
const BASIS_EPSILON: f32 = 1e-6;

/// Orthonormal view basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl CameraBasis {
    /// Express a world-space offset from the eye in view space.
    #[inline]
    pub fn to_view(&self, offset: Vec3) -> Vec3 {
        Vec3::new(
            offset.dot(self.right),
            offset.dot(self.up),
            offset.dot(self.forward),
        )
    }
}

/// Camera looking from `position` toward `target`.
///
/// World up is +Y; because the effect lives in screen-down coordinates the
/// derived `up` vector points along -Y for the default camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    fov: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1000.0),
            target: Vec3::ZERO,
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Vertical field of view in degrees.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Set the field of view in degrees, clamped to `[MIN_FOV, MAX_FOV]`.
    /// Non-finite values are ignored.
    pub fn set_fov(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.fov = degrees.clamp(MIN_FOV, MAX_FOV);
        }
    }

    /// Set the near plane, at least `MIN_NEAR`. Non-finite values are ignored.
    pub fn set_near(&mut self, near: f32) {
        if near.is_finite() {
            self.near = near.max(MIN_NEAR);
        }
    }

    /// Set the far plane. Non-finite values are ignored.
    pub fn set_far(&mut self, far: f32) {
        if far.is_finite() {
            self.far = far;
        }
    }

    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.set_fov(degrees);
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.set_near(near);
        self.set_far(far);
        self
    }

    /// Build the view basis.
    ///
    /// Fails when the camera sits on its target or looks straight along
    /// world up.
    pub fn basis(&self) -> Result<CameraBasis, ProjectionError> {
        let to_target = self.target - self.position;
        if !to_target.is_finite() || to_target.length() <= BASIS_EPSILON {
            return Err(ProjectionError::DegenerateBasis);
        }
        let forward = to_target.normalize();

        let side = forward.cross(Vec3::Y);
        if side.length() <= BASIS_EPSILON {
            return Err(ProjectionError::DegenerateBasis);
        }
        let right = side.normalize();
        let up = forward.cross(right);

        Ok(CameraBasis { forward, right, up })
    }

    /// Place the camera on a sphere of `distance` around `target`.
    ///
    /// `angle_x` is elevation and `angle_y` azimuth, both in radians. The far
    /// plane is pushed out to `3 * |distance|` so the target stays in range;
    /// it never moves in front of the near plane.
    pub fn rotate_orbit(&mut self, angle_x: f32, angle_y: f32, distance: f32, target: Vec3) {
        let (sin_x, cos_x) = angle_x.sin_cos();
        let (sin_y, cos_y) = angle_y.sin_cos();

        self.position = target + distance * Vec3::new(cos_x * sin_y, sin_x, cos_x * cos_y);
        self.target = target;
        let far = distance.abs() * 3.0;
        if far > self.near {
            self.far = far;
        }
    }
}
