//! # sparkburst
//!
//! 3D particle explosions with turbulence fields, perspective projection and
//! batched point-sprite rendering.
//!
//! The simulation is plain CPU code: a [`ParticleEngine`] owns the live
//! particles, steps them with quadratic air resistance and an optional
//! [`TurbulenceField`], and drops them when their lifetime runs out.
//! Rendering projects every particle to screen space and draws it either
//! through wgpu as instanced point sprites or with simple shapes on a CPU
//! surface.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sparkburst::prelude::*;
//!
//! let mut field = TurbulenceField::new();
//! field.create_random_pattern(Vec3::ZERO, 300.0, 50, 15.0, 80.0);
//!
//! let mut engine = ParticleEngine::new().with_turbulence(field);
//! engine.spawn_particles(Vec3::new(400.0, 300.0, 0.0), 200);
//!
//! let mut renderer = RenderEngine::canvas(ImageSurface::new(800, 600), RenderConfig::default());
//! let camera = Camera::default();
//!
//! loop {
//!     engine.update(16.0);
//!     engine.sort_particles();
//!     renderer.render_frame(engine.particles(), engine.turbulence(), &camera)?;
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles and factories
//!
//! A [`Particle`] gets a random initial impulse, a color from a white/red
//! palette and a lifetime. Its alpha fades linearly to zero. Which kind of
//! particle a burst produces is chosen by a [`ParticleFactory`]:
//!
//! ```ignore
//! engine.set_factory(ParticleFactory::Fire);
//! engine.set_factory(ParticleFactory::custom(|pos, ctx| {
//!     Particle::new(pos, ctx.random_direction(50.0), 1000.0, Color::WHITE, 2.0)
//! }));
//! ```
//!
//! ### Turbulence
//!
//! A turbulence field is a set of points, each pushing nearby particles in
//! its own direction with a [`Falloff`] that reaches zero at the point's
//! radius.
//!
//! ### Projection
//!
//! Two models are available. The simplified one scales around the
//! viewport centre by `perspective / (perspective + z)`. The camera one
//! goes through a [`Camera`] basis with field of view and clip planes.
//! Degenerate inputs return [`ProjectionError`] and the entity is skipped
//! for the frame.
//!
//! ### Rendering
//!
//! [`RenderEngine`] clears the target, draws particles and then turbulence
//! glyphs. The GPU path packs sprites into flat attribute arrays,
//! `batch_size` per draw call. [`RenderWorker`] moves rendering onto its
//! own thread and is fed [`FrameSnapshot`]s.

pub mod camera;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod math;
pub mod offload;
pub mod particle;
pub mod projection;
pub mod render;
pub mod spawn;
pub mod surface;
pub mod time;
pub mod turbulence;

pub use bytemuck;
pub use glam::{Vec2, Vec3};

pub use camera::Camera;
pub use color::Color;
pub use config::{ParticleConfig, RenderConfig, TurbulenceCoupling};
pub use engine::ParticleEngine;
pub use error::{GpuError, ProjectionError, RenderError};
pub use gpu::{GpuContext, GpuSpriteBackend};
pub use offload::{FrameSnapshot, RenderWorker, WorkerMessage};
pub use particle::{Particle, Sprite, SpriteData};
pub use projection::{project_point, project_point_camera, Projection, Projector, Viewport};
pub use render::{
    BatchRenderer, Canvas2dRenderer, FrameStats, ParticleProjection, RenderEngine, Renderer,
    SpriteBackend,
};
pub use spawn::{ParticleFactory, SpawnContext};
pub use surface::{DrawableSurface, ImageSurface};
pub use time::FrameClock;
pub use turbulence::{Falloff, TurbulenceField, TurbulencePoint};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use sparkburst::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::color::Color;
    pub use crate::config::{ParticleConfig, RenderConfig, TurbulenceCoupling};
    pub use crate::engine::ParticleEngine;
    pub use crate::error::{GpuError, ProjectionError, RenderError};
    pub use crate::gpu::{GpuContext, GpuSpriteBackend};
    pub use crate::offload::{FrameSnapshot, RenderWorker, WorkerMessage};
    pub use crate::particle::{Particle, Sprite};
    pub use crate::projection::{Projector, Viewport};
    pub use crate::render::{ParticleProjection, RenderEngine};
    pub use crate::spawn::{ParticleFactory, SpawnContext};
    pub use crate::surface::{DrawableSurface, ImageSurface};
    pub use crate::time::FrameClock;
    pub use crate::turbulence::{Falloff, TurbulenceField, TurbulencePoint};
    pub use crate::{Vec2, Vec3};
}
