//! A single simulated particle.
//!
//! Times are in milliseconds, speeds in world units per second. A particle
//! is alive while `lifetime < max_lifetime`; the engine drops it on the tick
//! it crosses that line.

use glam::Vec3;
use rand::Rng;

use crate::color::{pick_particle_color, Color};
use crate::math::random_unit_vector;
use crate::spawn::SpawnContext;

/// Read-only view of anything that can be drawn as a sprite.
///
/// Implemented by live [`Particle`]s and by the plain-data
/// [`SpriteData`] carried in frame snapshots, so renderers accept either.
pub trait Sprite {
    fn position(&self) -> Vec3;
    fn color(&self) -> Color;
    fn size(&self) -> f32;
    fn alpha(&self) -> f32;
}

/// Plain sprite attributes detached from any simulation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteData {
    pub position: Vec3,
    pub color: Color,
    pub size: f32,
    pub alpha: f32,
}

impl Sprite for SpriteData {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn color(&self) -> Color {
        self.color
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    position: Vec3,
    velocity: Vec3,
    lifetime: f32,
    max_lifetime: f32,
    color: Color,
    size: f32,
    air_resistance: f32,
}

impl Particle {
    /// Build a fully specified particle with no air resistance.
    pub fn new(position: Vec3, velocity: Vec3, max_lifetime: f32, color: Color, size: f32) -> Self {
        Self {
            position,
            velocity,
            lifetime: 0.0,
            max_lifetime,
            color,
            size,
            air_resistance: 0.0,
        }
    }

    /// Spawn a particle at `position` with a random impulse, lifetime and
    /// palette color drawn from the context.
    pub fn spawn(position: Vec3, ctx: &mut SpawnContext) -> Self {
        let config = *ctx.config();
        let rng = ctx.rng();

        let velocity = random_unit_vector(rng, config.initial_force);
        let max_lifetime =
            config.base_lifetime + (rng.gen::<f32>() - 0.5) * config.lifetime_variation;
        let color = pick_particle_color(rng, config.red_chance);

        Self {
            position,
            velocity,
            lifetime: 0.0,
            max_lifetime,
            color,
            size: config.size,
            air_resistance: config.air_resistance,
        }
    }

    /// Set the quadratic drag coefficient.
    pub fn with_air_resistance(mut self, coefficient: f32) -> Self {
        self.air_resistance = coefficient;
        self
    }

    /// Advance the particle by `delta_ms` milliseconds.
    ///
    /// Negative deltas are treated as zero and non-finite deltas are ignored.
    /// Drag is explicit Euler and is not clamped: it stays stable only while
    /// `air_resistance * |v|² * dt / 1000 < 1`.
    pub fn update(&mut self, delta_ms: f32) {
        if !delta_ms.is_finite() {
            return;
        }
        let delta_ms = delta_ms.max(0.0);
        let dt = delta_ms / 1000.0;

        self.apply_air_resistance(dt);
        self.position += self.velocity * dt;
        self.lifetime += delta_ms;
    }

    fn apply_air_resistance(&mut self, dt: f32) {
        let speed = self.velocity.length();
        if speed == 0.0 {
            return;
        }

        let drag = self.air_resistance * speed * speed;
        self.velocity *= 1.0 - drag * dt;
    }

    /// Add a turbulence sample straight into velocity.
    #[inline]
    pub fn apply_turbulence(&mut self, turbulence: Vec3) {
        self.velocity += turbulence;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lifetime < self.max_lifetime
    }

    /// Opacity from 1.0 at birth to 0.0 at `max_lifetime`.
    pub fn alpha(&self) -> f32 {
        if self.max_lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    #[inline]
    pub fn max_lifetime(&self) -> f32 {
        self.max_lifetime
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_velocity(&mut self, x: f32, y: f32, z: f32) {
        self.velocity = Vec3::new(x, y, z);
    }

    pub fn add_force(&mut self, x: f32, y: f32, z: f32) {
        self.velocity += Vec3::new(x, y, z);
    }

    pub fn add_velocity(&mut self, x: f32, y: f32, z: f32) {
        self.velocity = self.velocity + Vec3::new(x, y, z);
    }

    /// Detach the drawable attributes.
    pub fn sprite(&self) -> SpriteData {
        SpriteData {
            position: self.position,
            color: self.color,
            size: self.size,
            alpha: self.alpha(),
        }
    }
}

impl Sprite for Particle {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn color(&self) -> Color {
        self.color
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn alpha(&self) -> f32 {
        Particle::alpha(self)
    }
}
