//! Frame rendering: backend selection, projection choice and draw order.
//!
//! A [`RenderEngine`] clears the target, draws the particles and then, if
//! enabled, the turbulence glyphs on top. Particles use the simplified
//! perspective by default and glyphs always use the camera, matching how
//! the effect was tuned.

pub mod batch;
pub mod canvas;
pub mod shaders;

pub use batch::{
    pack_glyph, pack_sprite, BatchRenderer, GlyphBatch, PackedGlyph, PackedSprite, ParticleBatch,
    SpriteBackend,
};
pub use canvas::Canvas2dRenderer;
pub use shaders::{ProgramKind, CIRCLE_SHADER, TURBULENCE_SHADER};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::particle::Sprite;
use crate::projection::{Projector, Viewport};
use crate::surface::DrawableSurface;
use crate::turbulence::TurbulenceField;

/// Available drawing backends.
pub enum Renderer {
    /// CPU shapes on a [`DrawableSurface`]. Turbulence glyphs are not drawn.
    Canvas2d(Canvas2dRenderer<Box<dyn DrawableSurface>>),
    /// Batched point sprites through a [`SpriteBackend`].
    Gpu(BatchRenderer<Box<dyn SpriteBackend>>),
}

impl Renderer {
    pub fn name(&self) -> &'static str {
        match self {
            Renderer::Canvas2d(_) => "canvas2d",
            Renderer::Gpu(_) => "gpu",
        }
    }
}

/// Projection model used for particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleProjection {
    /// `perspective / (perspective + z)` scaling.
    #[default]
    Perspective,
    /// Full camera projection.
    Camera,
}

/// What one frame put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub particles: usize,
    pub glyphs: usize,
}

pub struct RenderEngine {
    renderer: Renderer,
    config: RenderConfig,
    viewport: Viewport,
    projection: ParticleProjection,
}

impl RenderEngine {
    pub fn new(renderer: Renderer, viewport: Viewport, config: RenderConfig) -> Self {
        log::debug!(
            "render engine using {} at {}x{}",
            renderer.name(),
            viewport.width,
            viewport.height
        );
        Self {
            renderer,
            config,
            viewport,
            projection: ParticleProjection::default(),
        }
    }

    /// Engine drawing onto a CPU surface.
    pub fn canvas<S: DrawableSurface + 'static>(surface: S, config: RenderConfig) -> Self {
        let viewport = surface.size();
        let boxed: Box<dyn DrawableSurface> = Box::new(surface);
        let renderer = Canvas2dRenderer::new(boxed).with_background(config.background);
        Self::new(Renderer::Canvas2d(renderer), viewport, config)
    }

    /// Engine drawing through a sprite backend.
    pub fn gpu<B: SpriteBackend + 'static>(
        backend: B,
        viewport: Viewport,
        config: RenderConfig,
    ) -> Self {
        let boxed: Box<dyn SpriteBackend> = Box::new(backend);
        let renderer = BatchRenderer::new(boxed, viewport, &config);
        Self::new(Renderer::Gpu(renderer), viewport, config)
    }

    pub fn with_particle_projection(mut self, projection: ParticleProjection) -> Self {
        self.projection = projection;
        self
    }

    /// Clear and draw one frame.
    pub fn render_frame<S: Sprite>(
        &mut self,
        particles: &[S],
        turbulence: Option<&TurbulenceField>,
        camera: &Camera,
    ) -> Result<FrameStats, RenderError> {
        let particle_projector = match self.projection {
            ParticleProjection::Perspective => Projector::Perspective {
                perspective: self.config.perspective,
            },
            ParticleProjection::Camera => Projector::Camera(camera),
        };
        let glyph_projector = Projector::Camera(camera);
        let show_glyphs = self.config.show_turbulence;

        let mut stats = FrameStats::default();
        match &mut self.renderer {
            Renderer::Canvas2d(canvas) => {
                canvas.clear()?;
                stats.particles = canvas.draw_particles_batch(particles, &particle_projector)?;
            }
            Renderer::Gpu(batch) => {
                batch.begin_frame()?;
                // A started frame is always ended, even when a draw fails
                let drawn = (|| {
                    batch.clear()?;
                    stats.particles = batch.draw_particles_batch(particles, &particle_projector)?;
                    if let Some(field) = turbulence.filter(|_| show_glyphs) {
                        stats.glyphs =
                            batch.draw_turbulence_points(field.points(), &glyph_projector)?;
                    }
                    Ok::<(), RenderError>(())
                })();
                batch.end_frame();
                drawn?;
            }
        }
        Ok(stats)
    }

    #[inline]
    pub fn perspective(&self) -> f32 {
        self.config.perspective
    }

    pub fn set_perspective(&mut self, perspective: f32) {
        self.config.perspective = perspective;
    }

    pub fn set_particle_projection(&mut self, projection: ParticleProjection) {
        self.projection = projection;
    }

    #[inline]
    pub fn particle_projection(&self) -> ParticleProjection {
        self.projection
    }

    pub fn set_show_turbulence(&mut self, show: bool) {
        self.config.show_turbulence = show;
    }

    #[inline]
    pub fn show_turbulence(&self) -> bool {
        self.config.show_turbulence
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        match &mut self.renderer {
            Renderer::Canvas2d(canvas) => canvas.resize(viewport),
            Renderer::Gpu(batch) => batch.resize(viewport),
        }
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Release renderer resources. Safe to call more than once.
    pub fn cleanup(&mut self) {
        match &mut self.renderer {
            Renderer::Canvas2d(canvas) => canvas.cleanup(),
            Renderer::Gpu(batch) => batch.cleanup(),
        }
    }
}
