//! World-to-screen projection.
//!
//! Two models are provided. The simplified one scales around the viewport
//! centre by `p / (p + z)` for a perspective constant `p`. The camera one
//! goes through a [`Camera`] view basis with field of view and clip planes.
//! Both are pure functions of their inputs and report degenerate
//! configurations as [`ProjectionError`] so callers can skip the entity.

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::error::ProjectionError;

/// Denominators at or below this are treated as singular.
pub const EPSILON: f32 = 1e-6;

/// Drawable area in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Screen-space result of projecting one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Depth cue, 0 when far and growing toward the viewer.
    pub z_factor: f32,
    pub distance_to_camera: f32,
}

impl Projection {
    fn checked(self) -> Result<Self, ProjectionError> {
        let all_finite = self.x.is_finite()
            && self.y.is_finite()
            && self.size.is_finite()
            && self.z_factor.is_finite()
            && self.distance_to_camera.is_finite();
        if all_finite {
            Ok(self)
        } else {
            Err(ProjectionError::NonFinite)
        }
    }
}

/// Simplified single-constant perspective.
pub fn project_point(
    position: Vec3,
    size: f32,
    perspective: f32,
    viewport: Viewport,
) -> Result<Projection, ProjectionError> {
    if !(perspective > 0.0) {
        return Err(ProjectionError::SingularPerspective);
    }
    let denominator = perspective + position.z;
    if !(denominator > EPSILON) {
        return Err(ProjectionError::SingularPerspective);
    }

    let scale = perspective / denominator;
    let center = viewport.center();
    let z_factor = (-position.z / perspective).max(0.0);

    Projection {
        x: (position.x - center.x) * scale + center.x,
        y: (position.y - center.y) * scale + center.y,
        size: size * (1.0 + z_factor * 0.2) * scale,
        z_factor,
        distance_to_camera: denominator,
    }
    .checked()
}

/// Full camera projection.
pub fn project_point_camera(
    position: Vec3,
    size: f32,
    camera: &Camera,
    viewport: Viewport,
) -> Result<Projection, ProjectionError> {
    if viewport.is_empty() {
        return Err(ProjectionError::EmptyViewport);
    }
    let basis = camera.basis()?;

    let offset = position - camera.position();
    let view = basis.to_view(offset);
    if !(view.z > EPSILON) {
        return Err(ProjectionError::BehindViewPlane);
    }

    let (near, far) = (camera.near(), camera.far());
    let depth_range = far - near;
    if !(depth_range > EPSILON) {
        return Err(ProjectionError::DegenerateDepthRange);
    }

    let scale = 1.0 / (camera.fov().to_radians() / 2.0).tan();
    let nx = view.x * scale / (view.z * viewport.aspect());
    let ny = view.y * scale / view.z;
    let z_factor = ((far - view.z) / depth_range).max(0.0);

    Projection {
        x: (nx + 1.0) * viewport.width / 2.0,
        y: (1.0 - ny) * viewport.height / 2.0,
        size: size * (1.0 + z_factor * 0.5) * (far / view.z),
        z_factor,
        distance_to_camera: offset.length(),
    }
    .checked()
}

/// Selects which projection model a renderer uses.
#[derive(Debug, Clone, Copy)]
pub enum Projector<'a> {
    Perspective { perspective: f32 },
    Camera(&'a Camera),
}

impl Projector<'_> {
    #[inline]
    pub fn project(
        &self,
        position: Vec3,
        size: f32,
        viewport: Viewport,
    ) -> Result<Projection, ProjectionError> {
        match self {
            Projector::Perspective { perspective } => {
                project_point(position, size, *perspective, viewport)
            }
            Projector::Camera(camera) => project_point_camera(position, size, camera, viewport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_simple_plane_z_zero_is_identity() {
        let p = project_point(Vec3::new(123.0, 456.0, 0.0), 3.0, 1000.0, VIEW).unwrap();
        assert!(close(p.x, 123.0));
        assert!(close(p.y, 456.0));
        assert!(close(p.size, 3.0));
        assert_eq!(p.z_factor, 0.0);
        assert_eq!(p.distance_to_camera, 1000.0);
    }

    #[test]
    fn test_simple_toward_viewer_grows() {
        let p = project_point(Vec3::new(600.0, 400.0, -500.0), 3.0, 1000.0, VIEW).unwrap();
        // scale = 2, z_factor = 0.5
        assert!(close(p.x, 700.0));
        assert!(close(p.y, 400.0));
        assert!(close(p.z_factor, 0.5));
        assert!(close(p.size, 3.0 * 1.1 * 2.0));
    }

    #[test]
    fn test_simple_singular() {
        assert_eq!(
            project_point(Vec3::new(0.0, 0.0, -1000.0), 1.0, 1000.0, VIEW),
            Err(ProjectionError::SingularPerspective)
        );
        assert_eq!(
            project_point(Vec3::new(0.0, 0.0, -1500.0), 1.0, 1000.0, VIEW),
            Err(ProjectionError::SingularPerspective)
        );
        assert_eq!(
            project_point(Vec3::ZERO, 1.0, 0.0, VIEW),
            Err(ProjectionError::SingularPerspective)
        );
        assert_eq!(
            project_point(Vec3::new(f32::NAN, 0.0, 0.0), 1.0, 1000.0, VIEW),
            Err(ProjectionError::NonFinite)
        );
    }

    #[test]
    fn test_camera_center_maps_to_viewport_center() {
        let camera = Camera::default();
        let p = project_point_camera(Vec3::ZERO, 3.0, &camera, VIEW).unwrap();
        assert!(close(p.x, 500.0));
        assert!(close(p.y, 400.0));
        assert!(close(p.distance_to_camera, 1000.0));
        // vz = 1000, far = 2000, near = 0.1
        let zf = (2000.0 - 1000.0) / (2000.0 - 0.1);
        assert!(close(p.z_factor, zf));
        assert!(close(p.size, 3.0 * (1.0 + zf * 0.5) * 2.0));
    }

    #[test]
    fn test_camera_screen_down_y() {
        let camera = Camera::default();
        let below = project_point_camera(Vec3::new(0.0, 100.0, 0.0), 3.0, &camera, VIEW).unwrap();
        let right = project_point_camera(Vec3::new(100.0, 0.0, 0.0), 3.0, &camera, VIEW).unwrap();
        assert!(below.y > 400.0);
        assert!(right.x > 500.0);
    }

    #[test]
    fn test_camera_errors() {
        let camera = Camera::default();
        assert_eq!(
            project_point_camera(Vec3::new(0.0, 0.0, 1000.0), 1.0, &camera, VIEW),
            Err(ProjectionError::BehindViewPlane)
        );
        assert_eq!(
            project_point_camera(Vec3::new(0.0, 0.0, 1500.0), 1.0, &camera, VIEW),
            Err(ProjectionError::BehindViewPlane)
        );
        assert_eq!(
            project_point_camera(Vec3::ZERO, 1.0, &camera, Viewport::new(0.0, 600.0)),
            Err(ProjectionError::EmptyViewport)
        );

        let flat = Camera::default().with_clip(1.0, 1.0);
        assert_eq!(
            project_point_camera(Vec3::ZERO, 1.0, &flat, VIEW),
            Err(ProjectionError::DegenerateDepthRange)
        );

        let inverted = Camera::default().with_clip(0.1, -100.0);
        assert_eq!(
            project_point_camera(Vec3::ZERO, 3.0, &inverted, VIEW),
            Err(ProjectionError::DegenerateDepthRange)
        );

        let behind_near = Camera::default().with_clip(500.0, 200.0);
        assert_eq!(
            project_point_camera(Vec3::ZERO, 3.0, &behind_near, VIEW),
            Err(ProjectionError::DegenerateDepthRange)
        );

        let stuck = Camera::new(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(
            project_point_camera(Vec3::ONE, 1.0, &stuck, VIEW),
            Err(ProjectionError::DegenerateBasis)
        );
    }

    #[test]
    fn test_projection_is_pure() {
        let camera = Camera::default();
        let pos = Vec3::new(37.0, -12.0, 250.0);
        for projector in [Projector::Perspective { perspective: 1000.0 }, Projector::Camera(&camera)] {
            let a = projector.project(pos, 3.0, VIEW).unwrap();
            let b = projector.project(pos, 3.0, VIEW).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_projection_is_continuous() {
        let camera = Camera::default();
        let pos = Vec3::new(37.0, -12.0, 250.0);
        let nudge = Vec3::splat(1e-3);
        for projector in [Projector::Perspective { perspective: 1000.0 }, Projector::Camera(&camera)] {
            let a = projector.project(pos, 3.0, VIEW).unwrap();
            let b = projector.project(pos + nudge, 3.0, VIEW).unwrap();
            assert!((a.x - b.x).abs() < 0.01);
            assert!((a.y - b.y).abs() < 0.01);
            assert!((a.size - b.size).abs() < 0.01);
        }
    }
}
