//! Tunable constants for simulation and rendering.
//!
//! Every magic number the effect depends on lives here with a named default.
//! The config structs follow the builder style used elsewhere in the crate:
//! start from `Default` and chain `with_*` calls.
//!
//! ```ignore
//! let particles = ParticleConfig::default()
//!     .with_initial_force(350.0)
//!     .with_red_chance(0.5);
//! let render = RenderConfig::default().with_batch_size(2048);
//! ```

use crate::color::Color;

/// Default speed (units per second) of a freshly spawned particle.
pub const DEFAULT_INITIAL_FORCE: f32 = 200.0;
/// Default quadratic air-resistance coefficient.
pub const DEFAULT_AIR_RESISTANCE: f32 = 0.000_08;
/// Default mean particle lifetime in milliseconds.
pub const DEFAULT_BASE_LIFETIME: f32 = 4000.0;
/// Default spread of particle lifetimes in milliseconds (± half of this).
pub const DEFAULT_LIFETIME_VARIATION: f32 = 2000.0;
/// Default probability of a particle being drawn from the red palette.
pub const DEFAULT_RED_CHANCE: f32 = 0.3;
/// Default particle size in world units.
pub const DEFAULT_PARTICLE_SIZE: f32 = 3.0;

/// Default number of sprites packed into one draw call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Default frame rate of the host loop.
pub const DEFAULT_FPS: f32 = 60.0;
/// Default perspective constant of the simplified projection.
pub const DEFAULT_PERSPECTIVE: f32 = 1000.0;

/// Default camera field of view in degrees.
pub const DEFAULT_FOV: f32 = 60.0;
/// Default camera near plane.
pub const DEFAULT_NEAR: f32 = 0.1;
/// Default camera far plane.
pub const DEFAULT_FAR: f32 = 2000.0;

/// How a turbulence sample is coupled into particle velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurbulenceCoupling {
    /// Added to velocity once per tick, independent of the tick length.
    #[default]
    Impulse,
    /// Treated as an acceleration and scaled by the tick length in seconds.
    Acceleration,
}

/// Per-particle simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleConfig {
    /// Speed of the initial random impulse.
    pub initial_force: f32,
    /// Quadratic drag coefficient.
    pub air_resistance: f32,
    /// Mean lifetime in milliseconds.
    pub base_lifetime: f32,
    /// Lifetime spread in milliseconds; actual lifetime is
    /// `base_lifetime ± lifetime_variation / 2`.
    pub lifetime_variation: f32,
    /// Probability (0.0-1.0) of picking a red palette entry instead of white.
    pub red_chance: f32,
    /// Particle size in world units.
    pub size: f32,
    /// Turbulence coupling mode.
    pub turbulence_coupling: TurbulenceCoupling,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            initial_force: DEFAULT_INITIAL_FORCE,
            air_resistance: DEFAULT_AIR_RESISTANCE,
            base_lifetime: DEFAULT_BASE_LIFETIME,
            lifetime_variation: DEFAULT_LIFETIME_VARIATION,
            red_chance: DEFAULT_RED_CHANCE,
            size: DEFAULT_PARTICLE_SIZE,
            turbulence_coupling: TurbulenceCoupling::Impulse,
        }
    }
}

impl ParticleConfig {
    /// Set the initial impulse speed.
    pub fn with_initial_force(mut self, force: f32) -> Self {
        self.initial_force = force;
        self
    }

    /// Set the quadratic drag coefficient.
    pub fn with_air_resistance(mut self, coefficient: f32) -> Self {
        self.air_resistance = coefficient;
        self
    }

    /// Set base lifetime and variation, both in milliseconds.
    pub fn with_lifetime(mut self, base: f32, variation: f32) -> Self {
        self.base_lifetime = base;
        self.lifetime_variation = variation.max(0.0);
        self
    }

    /// Set the red palette probability (clamped to 0.0-1.0).
    pub fn with_red_chance(mut self, chance: f32) -> Self {
        self.red_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the particle size.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set how turbulence feeds into velocity.
    pub fn with_turbulence_coupling(mut self, coupling: TurbulenceCoupling) -> Self {
        self.turbulence_coupling = coupling;
        self
    }

    /// Longest lifetime a particle can be given with this config.
    pub fn max_possible_lifetime(&self) -> f32 {
        self.base_lifetime + self.lifetime_variation / 2.0
    }
}

/// Renderer parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Sprites per draw call.
    pub batch_size: usize,
    /// Perspective constant for the simplified projection.
    pub perspective: f32,
    /// Clear color at frame start.
    pub background: Color,
    /// Whether turbulence glyphs are drawn on top of particles.
    pub show_turbulence: bool,
    /// Target frame rate of the host loop.
    pub fps: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            perspective: DEFAULT_PERSPECTIVE,
            background: Color::BLACK,
            show_turbulence: true,
            fps: DEFAULT_FPS,
        }
    }
}

impl RenderConfig {
    /// Set the number of sprites per draw call (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the simplified-projection perspective constant.
    pub fn with_perspective(mut self, perspective: f32) -> Self {
        self.perspective = perspective;
        self
    }

    /// Set the clear color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Toggle turbulence glyph rendering.
    pub fn with_turbulence_glyphs(mut self, show: bool) -> Self {
        self.show_turbulence = show;
        self
    }

    /// Set the target frame rate.
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }
}
