//! Turbulence fields: sparse sets of localized velocity perturbations.
//!
//! A field is a list of [`TurbulencePoint`]s. Querying a position sums the
//! direction of every point whose radius reaches it, weighted by a falloff
//! curve that is 1 at the point itself and exactly 0 at its radius.
//!
//! ```ignore
//! let mut field = TurbulenceField::with_seed(7);
//! field.create_random_pattern(Vec3::new(500.0, 500.0, 0.0), 300.0, 50, 10.0, 80.0);
//! let push = field.turbulence_at(particle.position());
//! ```

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::math;

/// One perturbation source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurbulencePoint {
    pub position: Vec3,
    /// Already scaled by the force the point was created with.
    pub direction: Vec3,
    pub radius: f32,
}

impl TurbulencePoint {
    pub fn new(position: Vec3, direction: Vec3, radius: f32) -> Self {
        Self {
            position,
            direction,
            radius,
        }
    }

    /// Contribution of this point at `position` under `falloff`.
    #[inline]
    pub fn contribution(&self, position: Vec3, falloff: Falloff) -> Vec3 {
        if self.radius <= 0.0 {
            return Vec3::ZERO;
        }
        let distance = math::distance(position, self.position);
        if distance >= self.radius {
            return Vec3::ZERO;
        }
        self.direction * falloff.influence(distance, self.radius)
    }
}

/// Distance falloff curve.
///
/// Every variant is continuous, non-increasing in distance, 1 at distance 0
/// and 0 at the radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Falloff {
    /// Gaussian with sigma = radius / 3, shifted and rescaled to hit 0 at the
    /// radius.
    #[default]
    Gaussian,
    /// `1 - smoothstep(0, radius, distance)`.
    Smooth,
    /// `1 - distance / radius`.
    Linear,
}

impl Falloff {
    /// Influence weight for a point `distance` away with the given `radius`.
    pub fn influence(&self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 || distance >= radius {
            return 0.0;
        }
        let t = (distance / radius).max(0.0);
        match self {
            Falloff::Gaussian => {
                let floor = (-4.5f32).exp();
                (((-4.5 * t * t).exp() - floor) / (1.0 - floor)).clamp(0.0, 1.0)
            }
            Falloff::Smooth => 1.0 - t * t * (3.0 - 2.0 * t),
            Falloff::Linear => 1.0 - t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurbulenceField {
    points: Vec<TurbulencePoint>,
    falloff: Falloff,
    rng: SmallRng,
}

impl Default for TurbulenceField {
    fn default() -> Self {
        Self::new()
    }
}

impl TurbulenceField {
    /// Empty field seeded from the clock.
    pub fn new() -> Self {
        Self::with_seed(math::clock_seed())
    }

    /// Empty field with a fixed RNG seed; pattern generators are then
    /// deterministic.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            points: Vec::new(),
            falloff: Falloff::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    #[inline]
    pub fn falloff(&self) -> Falloff {
        self.falloff
    }

    /// Summed perturbation at `position`.
    pub fn turbulence_at(&self, position: Vec3) -> Vec3 {
        self.points
            .iter()
            .map(|p| p.contribution(position, self.falloff))
            .fold(Vec3::ZERO, |acc, c| acc + c)
    }

    /// Replace the field with `count` points scattered uniformly through a
    /// sphere of `radius` around `center`.
    pub fn create_random_pattern(
        &mut self,
        center: Vec3,
        radius: f32,
        count: usize,
        force: f32,
        point_radius: f32,
    ) {
        self.points.clear();
        self.points.reserve(count);
        for _ in 0..count {
            let position = math::random_in_sphere(&mut self.rng, center, radius);
            let direction = math::random_unit_vector(&mut self.rng, force);
            self.points
                .push(TurbulencePoint::new(position, direction, point_radius));
        }
    }

    /// Replace the field with a `cells`³ lattice spanning
    /// `center ± half_extent`, each point pushing in a random direction.
    pub fn create_grid_pattern(
        &mut self,
        center: Vec3,
        half_extent: f32,
        cells: u32,
        force: f32,
        point_radius: f32,
    ) {
        self.points.clear();
        if cells == 0 {
            return;
        }

        let step = |i: u32| -> f32 {
            if cells == 1 {
                0.0
            } else {
                (i as f32 / (cells - 1) as f32) * 2.0 - 1.0
            }
        };

        for z in 0..cells {
            for y in 0..cells {
                for x in 0..cells {
                    let offset = Vec3::new(step(x), step(y), step(z)) * half_extent;
                    let direction = math::random_unit_vector(&mut self.rng, force);
                    self.points.push(TurbulencePoint::new(
                        center + offset,
                        direction,
                        point_radius,
                    ));
                }
            }
        }
    }

    /// Replace the field with `count` points evenly spaced on a ring in the
    /// XY plane, each pushing along the ring's tangent.
    pub fn create_vortex_pattern(
        &mut self,
        center: Vec3,
        ring_radius: f32,
        count: usize,
        force: f32,
        point_radius: f32,
    ) {
        self.points.clear();
        self.points.reserve(count);
        for i in 0..count {
            let angle = i as f32 / count as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            let position = center + Vec3::new(cos, sin, 0.0) * ring_radius;
            let direction = Vec3::new(-sin, cos, 0.0) * force;
            self.points
                .push(TurbulencePoint::new(position, direction, point_radius));
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn add_point(&mut self, point: TurbulencePoint) {
        self.points.push(point);
    }

    /// Remove the point at `index`, if there is one.
    pub fn remove_point(&mut self, index: usize) -> Option<TurbulencePoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    #[inline]
    pub fn points(&self) -> &[TurbulencePoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Falloff; 3] = [Falloff::Gaussian, Falloff::Smooth, Falloff::Linear];

    #[test]
    fn test_falloff_endpoints() {
        for f in ALL {
            assert!((f.influence(0.0, 20.0) - 1.0).abs() < 1e-6, "{:?}", f);
            assert_eq!(f.influence(20.0, 20.0), 0.0);
            assert_eq!(f.influence(35.0, 20.0), 0.0);
            assert_eq!(f.influence(0.0, 0.0), 0.0);
        }
    }

    #[test]
    fn test_falloff_monotonic() {
        for f in ALL {
            let mut last = f.influence(0.0, 50.0);
            for i in 1..=500 {
                let w = f.influence(i as f32 * 0.1, 50.0);
                assert!(w <= last + 1e-6, "{:?} rose at {}", f, i);
                last = w;
            }
        }
    }

    #[test]
    fn test_full_direction_at_center() {
        let mut field = TurbulenceField::with_seed(1);
        let dir = Vec3::new(3.0, -4.0, 12.0);
        field.add_point(TurbulencePoint::new(Vec3::new(10.0, 10.0, 10.0), dir, 20.0));
        let t = field.turbulence_at(Vec3::new(10.0, 10.0, 10.0));
        assert!((t - dir).length() < 1e-4);
    }

    #[test]
    fn test_zero_at_and_beyond_radius() {
        let mut field = TurbulenceField::with_seed(1);
        field.add_point(TurbulencePoint::new(Vec3::ZERO, Vec3::X * 10.0, 20.0));
        assert_eq!(field.turbulence_at(Vec3::new(20.0, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(field.turbulence_at(Vec3::new(0.0, 0.0, -25.0)), Vec3::ZERO);
    }

    #[test]
    fn test_contributions_sum() {
        let mut field = TurbulenceField::with_seed(1);
        let a = TurbulencePoint::new(Vec3::ZERO, Vec3::X * 10.0, 30.0);
        let b = TurbulencePoint::new(Vec3::new(5.0, 0.0, 0.0), Vec3::Y * 4.0, 30.0);
        let c = TurbulencePoint::new(Vec3::new(500.0, 0.0, 0.0), Vec3::Z, 30.0);
        field.add_point(a);
        field.add_point(b);
        field.add_point(c);

        let q = Vec3::new(2.0, 1.0, 0.0);
        let expected = a.contribution(q, Falloff::Gaussian) + b.contribution(q, Falloff::Gaussian);
        assert!((field.turbulence_at(q) - expected).length() < 1e-5);
    }

    #[test]
    fn test_random_pattern_scenario() {
        let mut field = TurbulenceField::with_seed(9);
        field.create_random_pattern(Vec3::ZERO, 100.0, 50, 10.0, 20.0);
        assert_eq!(field.len(), 50);
        for p in field.points() {
            assert!(p.position.length() <= 100.0 + 1e-3);
            assert!((p.direction.length() - 10.0).abs() < 1e-3);
            assert_eq!(p.radius, 20.0);
        }
    }

    #[test]
    fn test_random_pattern_replaces() {
        let mut field = TurbulenceField::with_seed(9);
        field.create_random_pattern(Vec3::ZERO, 100.0, 50, 10.0, 20.0);
        field.create_random_pattern(Vec3::ZERO, 100.0, 5, 10.0, 20.0);
        assert_eq!(field.len(), 5);
    }

    #[test]
    fn test_same_seed_same_pattern() {
        let mut a = TurbulenceField::with_seed(4);
        let mut b = TurbulenceField::with_seed(4);
        a.create_random_pattern(Vec3::ZERO, 10.0, 8, 1.0, 2.0);
        b.create_random_pattern(Vec3::ZERO, 10.0, 8, 1.0, 2.0);
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn test_grid_pattern() {
        let mut field = TurbulenceField::with_seed(2);
        field.create_grid_pattern(Vec3::ZERO, 100.0, 3, 5.0, 40.0);
        assert_eq!(field.len(), 27);
        assert_eq!(field.points()[0].position, Vec3::splat(-100.0));
        assert_eq!(field.points()[26].position, Vec3::splat(100.0));
        assert_eq!(field.points()[13].position, Vec3::ZERO);

        field.create_grid_pattern(Vec3::ONE, 100.0, 1, 5.0, 40.0);
        assert_eq!(field.len(), 1);
        assert_eq!(field.points()[0].position, Vec3::ONE);
    }

    #[test]
    fn test_vortex_tangential() {
        let mut field = TurbulenceField::with_seed(2);
        let center = Vec3::new(50.0, 50.0, 0.0);
        field.create_vortex_pattern(center, 100.0, 12, 8.0, 30.0);
        assert_eq!(field.len(), 12);
        for p in field.points() {
            let radial = p.position - center;
            assert!((radial.length() - 100.0).abs() < 1e-3);
            assert!(radial.dot(p.direction).abs() < 1e-2);
            assert!((p.direction.length() - 8.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_remove_point() {
        let mut field = TurbulenceField::with_seed(0);
        field.add_point(TurbulencePoint::new(Vec3::ZERO, Vec3::X, 1.0));
        field.add_point(TurbulencePoint::new(Vec3::ONE, Vec3::Y, 1.0));
        let removed = field.remove_point(0);
        assert_eq!(removed.map(|p| p.direction), Some(Vec3::X));
        assert_eq!(field.remove_point(5), None);
        assert_eq!(field.len(), 1);
        field.clear();
        assert!(field.is_empty());
    }
}
