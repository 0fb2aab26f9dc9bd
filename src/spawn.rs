//! Spawn context and particle factories.
//!
//! A [`SpawnContext`] carries the RNG and the [`ParticleConfig`] every new
//! particle is drawn from. A [`ParticleFactory`] decides what kind of
//! particle to build at a spawn position:
//!
//! ```ignore
//! // Fountain: every particle starts straight up
//! engine.set_factory(ParticleFactory::Fire);
//!
//! // Anything else
//! engine.set_factory(ParticleFactory::custom(|pos, ctx| {
//!     let mut p = Particle::spawn(pos, ctx);
//!     p.add_force(0.0, -ctx.random_range(50.0, 150.0), 0.0);
//!     p
//! }));
//! ```

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ParticleConfig;
use crate::math;
use crate::particle::Particle;

/// RNG and config shared by all particles of one engine.
pub struct SpawnContext {
    config: ParticleConfig,
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context seeded from the clock.
    pub fn new(config: ParticleConfig) -> Self {
        Self::with_seed(config, math::clock_seed())
    }

    /// Create a context with a fixed seed, for reproducible runs.
    pub fn with_seed(config: ParticleConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParticleConfig) {
        self.config = config;
    }

    /// Direct access to the RNG for custom factories.
    #[inline]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `min..max`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Random direction scaled to `length`.
    pub fn random_direction(&mut self, length: f32) -> Vec3 {
        math::random_unit_vector(&mut self.rng, length)
    }

    /// Random point inside a sphere around `center`.
    pub fn random_in_sphere(&mut self, center: Vec3, radius: f32) -> Vec3 {
        math::random_in_sphere(&mut self.rng, center, radius)
    }
}

impl fmt::Debug for SpawnContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// User-supplied particle constructor.
pub type SpawnFn = dyn Fn(Vec3, &mut SpawnContext) -> Particle + Send + Sync;

/// Strategy used by the engine to build each new particle.
#[derive(Clone, Default)]
pub enum ParticleFactory {
    /// Random burst in every direction.
    #[default]
    Default,
    /// Rises: velocity `(0, -initial_force, 0)` in screen-down Y.
    Fire,
    /// Falls: velocity `(0, initial_force, 0)`.
    Water,
    /// Arbitrary constructor.
    Custom(Arc<SpawnFn>),
}

impl ParticleFactory {
    /// Wrap a closure as a factory.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Vec3, &mut SpawnContext) -> Particle + Send + Sync + 'static,
    {
        ParticleFactory::Custom(Arc::new(f))
    }

    /// Build one particle at `position`.
    pub fn create(&self, position: Vec3, ctx: &mut SpawnContext) -> Particle {
        match self {
            ParticleFactory::Default => Particle::spawn(position, ctx),
            ParticleFactory::Fire => {
                let force = ctx.config().initial_force;
                let mut particle = Particle::spawn(position, ctx);
                particle.set_velocity(0.0, -force, 0.0);
                particle
            }
            ParticleFactory::Water => {
                let force = ctx.config().initial_force;
                let mut particle = Particle::spawn(position, ctx);
                particle.set_velocity(0.0, force, 0.0);
                particle
            }
            ParticleFactory::Custom(f) => f(position, ctx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParticleFactory::Default => "default",
            ParticleFactory::Fire => "fire",
            ParticleFactory::Water => "water",
            ParticleFactory::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for ParticleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticleFactory::{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn ctx() -> SpawnContext {
        SpawnContext::with_seed(ParticleConfig::default(), 3)
    }

    #[test]
    fn test_fire_rises_water_falls() {
        let mut ctx = ctx();
        let fire = ParticleFactory::Fire.create(Vec3::ZERO, &mut ctx);
        let water = ParticleFactory::Water.create(Vec3::ZERO, &mut ctx);
        assert_eq!(fire.velocity(), Vec3::new(0.0, -200.0, 0.0));
        assert_eq!(water.velocity(), Vec3::new(0.0, 200.0, 0.0));
    }

    #[test]
    fn test_default_factory_spawns_at_position() {
        let mut ctx = ctx();
        let pos = Vec3::new(500.0, 500.0, 0.0);
        let p = ParticleFactory::default().create(pos, &mut ctx);
        assert_eq!(p.position(), pos);
        assert!(p.is_alive());
    }

    #[test]
    fn test_custom_factory() {
        let factory = ParticleFactory::custom(|pos, _ctx| {
            Particle::new(pos, Vec3::X, 10.0, Color::RED, 1.0)
        });
        let p = factory.create(Vec3::ONE, &mut ctx());
        assert_eq!(p.velocity(), Vec3::X);
        assert_eq!(p.color(), Color::RED);
        assert_eq!(format!("{:?}", factory), "ParticleFactory::custom");
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = ctx();
        let mut b = ctx();
        for _ in 0..10 {
            assert_eq!(
                Particle::spawn(Vec3::ZERO, &mut a),
                Particle::spawn(Vec3::ZERO, &mut b)
            );
        }
    }

    #[test]
    fn test_random_range_empty() {
        assert_eq!(ctx().random_range(5.0, 5.0), 5.0);
    }
}
