//! Small vector helpers on top of `glam`.
//!
//! Distance, magnitude and addition are the plain `Vec3` operations
//! (`a.distance(b)`, `v.length()`, `a + b`); this module adds the random
//! sampling and zero-guarded normalization the simulation needs.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Length of a vector.
#[inline]
pub fn magnitude(v: Vec3) -> f32 {
    v.length()
}

/// Normalize `v`, returning zero for a zero-length (or non-finite) input.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Seed derived from the wall clock, different on each run.
pub fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

/// Random direction scaled to `length`.
///
/// Three independent samples in [-1, 1] are normalized, so the result is
/// biased toward the cube diagonals; the burst shape depends on that. A
/// degenerate all-zero sample yields the zero vector.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R, length: f32) -> Vec3 {
    let v = Vec3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    );
    normalize_or_zero(v) * length
}

/// Random point inside a solid sphere, uniform in volume.
pub fn random_in_sphere<R: Rng + ?Sized>(rng: &mut R, center: Vec3, radius: f32) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    // Cube root for uniform volume distribution
    let r = radius * rng.gen::<f32>().cbrt();

    center
        + Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize_or_zero(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(normalize_or_zero(Vec3::new(0.0, 3.0, 0.0)), Vec3::Y);
    }

    #[test]
    fn test_random_unit_vector_length() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng, 200.0);
            assert!((v.length() - 200.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_random_in_sphere_bounds() {
        let mut rng = SmallRng::seed_from_u64(2);
        let center = Vec3::new(10.0, -5.0, 3.0);
        for _ in 0..500 {
            let p = random_in_sphere(&mut rng, center, 0.5);
            assert!(distance(p, center) <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_clock_seed_changes() {
        let a = clock_seed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_ne!(a, clock_seed());
    }

    #[test]
    fn test_distance_and_magnitude() {
        assert_eq!(distance(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)), 5.0);
        assert_eq!(magnitude(Vec3::new(0.0, 0.0, -2.0)), 2.0);
    }
}
