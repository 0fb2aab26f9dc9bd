//! Particle engine: owns the live population and steps it.

use glam::Vec3;

use crate::config::{ParticleConfig, TurbulenceCoupling};
use crate::offload::FrameSnapshot;
use crate::particle::Particle;
use crate::spawn::{ParticleFactory, SpawnContext};
use crate::turbulence::TurbulenceField;

/// Owns every live particle, the active factory and an optional
/// turbulence field.
///
/// # Example
///
/// ```ignore
/// let mut engine = ParticleEngine::new()
///     .with_config(ParticleConfig::default().with_initial_force(300.0));
/// engine.spawn_particles(Vec3::new(400.0, 300.0, 0.0), 200);
///
/// loop {
///     engine.update(16.0);
///     engine.sort_particles();
///     renderer.render_frame(engine.particles(), engine.turbulence(), &camera)?;
/// }
/// ```
#[derive(Debug)]
pub struct ParticleEngine {
    particles: Vec<Particle>,
    turbulence: Option<TurbulenceField>,
    factory: ParticleFactory,
    ctx: SpawnContext,
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleEngine {
    /// Engine with default config, default factory and no turbulence.
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            turbulence: None,
            factory: ParticleFactory::Default,
            ctx: SpawnContext::new(ParticleConfig::default()),
        }
    }

    /// Engine whose spawns are reproducible for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            ctx: SpawnContext::with_seed(ParticleConfig::default(), seed),
            ..Self::new()
        }
    }

    /// Replace the particle config used for subsequent spawns.
    pub fn with_config(mut self, config: ParticleConfig) -> Self {
        self.ctx.set_config(config);
        self
    }

    /// Attach a turbulence field.
    pub fn with_turbulence(mut self, field: TurbulenceField) -> Self {
        self.turbulence = Some(field);
        self
    }

    /// Use `factory` for subsequent spawns.
    pub fn with_factory(mut self, factory: ParticleFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Append `amount` particles at `position`.
    pub fn spawn_particles(&mut self, position: Vec3, amount: usize) {
        self.particles.reserve(amount);
        for _ in 0..amount {
            let particle = self.factory.create(position, &mut self.ctx);
            self.particles.push(particle);
        }
        log::trace!(
            "spawned {} {} particles at {:?} ({} live)",
            amount,
            self.factory.name(),
            position,
            self.particles.len()
        );
    }

    /// Step every live particle by `delta_ms` and drop the dead ones.
    pub fn update(&mut self, delta_ms: f32) {
        if !delta_ms.is_finite() {
            log::trace!("ignoring non-finite delta {}", delta_ms);
            return;
        }
        let delta_ms = delta_ms.max(0.0);

        let coupling = self.ctx.config().turbulence_coupling;
        let field = self.turbulence.as_ref();

        for particle in &mut self.particles {
            if let Some(field) = field {
                let t = field.turbulence_at(particle.position());
                let t = match coupling {
                    TurbulenceCoupling::Impulse => t,
                    TurbulenceCoupling::Acceleration => t * (delta_ms / 1000.0),
                };
                particle.apply_turbulence(t);
            }
            particle.update(delta_ms);
        }

        self.particles.retain(Particle::is_alive);
    }

    /// Order particles back to front: largest Z first.
    pub fn sort_particles(&mut self) {
        self.particles
            .sort_by(|a, b| b.position().z.total_cmp(&a.position().z));
    }

    /// Add the same velocity change to every live particle.
    pub fn apply_force_all(&mut self, force: Vec3) {
        for particle in &mut self.particles {
            particle.apply_turbulence(force);
        }
    }

    pub fn set_factory(&mut self, factory: ParticleFactory) {
        self.factory = factory;
    }

    #[inline]
    pub fn factory(&self) -> &ParticleFactory {
        &self.factory
    }

    pub fn set_config(&mut self, config: ParticleConfig) {
        self.ctx.set_config(config);
    }

    #[inline]
    pub fn config(&self) -> &ParticleConfig {
        self.ctx.config()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn set_turbulence(&mut self, field: Option<TurbulenceField>) {
        self.turbulence = field;
    }

    #[inline]
    pub fn turbulence(&self) -> Option<&TurbulenceField> {
        self.turbulence.as_ref()
    }

    #[inline]
    pub fn turbulence_mut(&mut self) -> Option<&mut TurbulenceField> {
        self.turbulence.as_mut()
    }

    /// Copy the drawable state of every live particle into plain arrays.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::from_sprites(&self.particles)
    }
}
