//! Batched sprite packing and submission.
//!
//! Sprites are projected on the CPU and packed into flat parallel arrays,
//! at most `batch_size` at a time. Each full or final partial chunk goes to
//! the backend as one draw. The arrays are kept between frames so a steady
//! population allocates nothing after the first frame.

use glam::Vec2;

use crate::color::Color;
use crate::config::RenderConfig;
use crate::error::{ProjectionError, RenderError};
use crate::particle::Sprite;
use crate::projection::{Projector, Viewport};
use crate::turbulence::TurbulencePoint;

/// One projected particle ready for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedSprite {
    pub position: Vec2,
    pub color: [f32; 3],
    pub size: f32,
    pub alpha: f32,
}

/// One projected turbulence glyph ready for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedGlyph {
    pub position: Vec2,
    pub color: [f32; 3],
    pub size: f32,
    /// Screen-space arrow vector in pixels.
    pub direction: Vec2,
    /// Projected influence radius in pixels.
    pub radius: f32,
}

/// Project and pack a single sprite.
pub fn pack_sprite<S: Sprite + ?Sized>(
    sprite: &S,
    projector: &Projector<'_>,
    viewport: Viewport,
) -> Result<PackedSprite, ProjectionError> {
    let projected = projector.project(sprite.position(), sprite.size(), viewport)?;
    Ok(PackedSprite {
        position: Vec2::new(projected.x, projected.y),
        color: sprite.color().normalized(),
        size: projected.size,
        alpha: sprite.alpha(),
    })
}

/// Project and pack a single turbulence point.
///
/// Only the centre must project. If the arrow tip fails to project the
/// arrow falls back to a short horizontal one; if the radius edge fails the
/// influence disk is dropped.
pub fn pack_glyph(
    point: &TurbulencePoint,
    projector: &Projector<'_>,
    viewport: Viewport,
) -> Result<PackedGlyph, ProjectionError> {
    let center = projector.project(point.position, 1.0, viewport)?;
    let magnitude = point.direction.length();

    let heat = (magnitude / 20.0).min(1.0);
    let color = [heat, 0.0, 1.0 - heat];

    let size = (point.radius / 8.0).max(12.0) * (1.0 + center.z_factor * 0.5);

    let fallback = Vec2::new(magnitude * 0.1, 0.0);
    let direction = match projector.project(point.position + point.direction, 1.0, viewport) {
        Ok(tip) => {
            let delta = Vec2::new(tip.x - center.x, tip.y - center.y);
            let length = delta.length();
            if length > 0.001 {
                delta / length * (magnitude / 2.0).clamp(10.0, 50.0)
            } else {
                fallback
            }
        }
        Err(_) => fallback,
    };

    let edge = point.position + glam::Vec3::new(point.radius, 0.0, 0.0);
    let radius = match projector.project(edge, 1.0, viewport) {
        Ok(edge) => (edge.x - center.x).abs() * (1.0 + center.z_factor * 0.3),
        Err(_) => 0.0,
    };

    Ok(PackedGlyph {
        position: Vec2::new(center.x, center.y),
        color,
        size,
        direction,
        radius,
    })
}

/// Flat per-attribute arrays for one particle draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleBatch {
    /// x, y per sprite.
    pub positions: Vec<f32>,
    /// r, g, b per sprite, 0.0-1.0.
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
    pub alphas: Vec<f32>,
}

impl ParticleBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity * 2),
            colors: Vec::with_capacity(capacity * 3),
            sizes: Vec::with_capacity(capacity),
            alphas: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sprite: &PackedSprite) {
        self.positions.extend_from_slice(&[sprite.position.x, sprite.position.y]);
        self.colors.extend_from_slice(&sprite.color);
        self.sizes.push(sprite.size);
        self.alphas.push(sprite.alpha);
    }

    /// Read back the sprite at `index`.
    pub fn get(&self, index: usize) -> Option<PackedSprite> {
        if index >= self.len() {
            return None;
        }
        let c = &self.colors[index * 3..index * 3 + 3];
        Some(PackedSprite {
            position: Vec2::new(self.positions[index * 2], self.positions[index * 2 + 1]),
            color: [c[0], c[1], c[2]],
            size: self.sizes[index],
            alpha: self.alphas[index],
        })
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
        self.alphas.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Flat per-attribute arrays for one glyph draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBatch {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
    /// dx, dy per glyph.
    pub directions: Vec<f32>,
    pub radii: Vec<f32>,
}

impl GlyphBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity * 2),
            colors: Vec::with_capacity(capacity * 3),
            sizes: Vec::with_capacity(capacity),
            directions: Vec::with_capacity(capacity * 2),
            radii: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, glyph: &PackedGlyph) {
        self.positions.extend_from_slice(&[glyph.position.x, glyph.position.y]);
        self.colors.extend_from_slice(&glyph.color);
        self.sizes.push(glyph.size);
        self.directions.extend_from_slice(&[glyph.direction.x, glyph.direction.y]);
        self.radii.push(glyph.radius);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
        self.directions.clear();
        self.radii.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Something that can put packed batches on screen.
///
/// Each `draw_*` call is one draw submission. A frame is bracketed by
/// `begin_frame` and `end_frame`; backends drawing into a fixed target can
/// leave both as no-ops.
pub trait SpriteBackend {
    /// Acquire whatever the next frame draws into.
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
    /// Present the frame started by `begin_frame`.
    fn end_frame(&mut self) {}
    fn clear(&mut self, color: Color) -> Result<(), RenderError>;
    fn draw_particles(&mut self, batch: &ParticleBatch) -> Result<(), RenderError>;
    fn draw_glyphs(&mut self, batch: &GlyphBatch) -> Result<(), RenderError>;
    fn resize(&mut self, viewport: Viewport);
    /// Free backend resources. Called at most once.
    fn release(&mut self);
}

impl<T: SpriteBackend + ?Sized> SpriteBackend for Box<T> {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        (**self).begin_frame()
    }

    fn end_frame(&mut self) {
        (**self).end_frame()
    }

    fn clear(&mut self, color: Color) -> Result<(), RenderError> {
        (**self).clear(color)
    }

    fn draw_particles(&mut self, batch: &ParticleBatch) -> Result<(), RenderError> {
        (**self).draw_particles(batch)
    }

    fn draw_glyphs(&mut self, batch: &GlyphBatch) -> Result<(), RenderError> {
        (**self).draw_glyphs(batch)
    }

    fn resize(&mut self, viewport: Viewport) {
        (**self).resize(viewport)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Chunks sprites into batches and hands them to a [`SpriteBackend`].
pub struct BatchRenderer<B: SpriteBackend> {
    backend: B,
    batch_size: usize,
    background: Color,
    viewport: Viewport,
    particles: ParticleBatch,
    glyphs: GlyphBatch,
    released: bool,
}

impl<B: SpriteBackend> BatchRenderer<B> {
    pub fn new(backend: B, viewport: Viewport, config: &RenderConfig) -> Self {
        let batch_size = config.batch_size.max(1);
        Self {
            backend,
            batch_size,
            background: config.background,
            viewport,
            particles: ParticleBatch::with_capacity(batch_size),
            glyphs: GlyphBatch::with_capacity(batch_size),
            released: false,
        }
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.released {
            Err(RenderError::Released)
        } else {
            Ok(())
        }
    }

    /// Start a frame on the backend.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.backend.begin_frame()
    }

    /// Finish the frame started by [`begin_frame`](Self::begin_frame).
    pub fn end_frame(&mut self) {
        if !self.released {
            self.backend.end_frame();
        }
    }

    /// Clear the target to the background color.
    pub fn clear(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.backend.clear(self.background)
    }

    /// Draw one sprite as its own batch.
    pub fn draw_particle<S: Sprite>(
        &mut self,
        sprite: &S,
        projector: &Projector<'_>,
    ) -> Result<(), RenderError> {
        self.draw_particles_batch(std::slice::from_ref(sprite), projector)
            .map(|_| ())
    }

    /// Draw every sprite, `batch_size` per draw call.
    ///
    /// Returns how many sprites were drawn; sprites that fail to project
    /// are skipped.
    pub fn draw_particles_batch<S: Sprite>(
        &mut self,
        sprites: &[S],
        projector: &Projector<'_>,
    ) -> Result<usize, RenderError> {
        self.ensure_live()?;
        let mut drawn = 0;

        for chunk in sprites.chunks(self.batch_size) {
            self.particles.clear();
            for sprite in chunk {
                match pack_sprite(sprite, projector, self.viewport) {
                    Ok(packed) => self.particles.push(&packed),
                    Err(e) => log::trace!("skipping sprite at {:?}: {}", sprite.position(), e),
                }
            }
            if self.particles.is_empty() {
                continue;
            }
            self.backend.draw_particles(&self.particles)?;
            drawn += self.particles.len();
        }

        Ok(drawn)
    }

    /// Draw turbulence glyphs, `batch_size` per draw call.
    pub fn draw_turbulence_points(
        &mut self,
        points: &[TurbulencePoint],
        projector: &Projector<'_>,
    ) -> Result<usize, RenderError> {
        self.ensure_live()?;
        let mut drawn = 0;

        for chunk in points.chunks(self.batch_size) {
            self.glyphs.clear();
            for point in chunk {
                match pack_glyph(point, projector, self.viewport) {
                    Ok(packed) => self.glyphs.push(&packed),
                    Err(e) => log::trace!("skipping glyph at {:?}: {}", point.position, e),
                }
            }
            if self.glyphs.is_empty() {
                continue;
            }
            self.backend.draw_glyphs(&self.glyphs)?;
            drawn += self.glyphs.len();
        }

        Ok(drawn)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.released {
            self.backend.resize(viewport);
        }
    }

    /// Release backend resources. Further calls do nothing.
    pub fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.backend.release();
        self.particles = ParticleBatch::default();
        self.glyphs = GlyphBatch::default();
        self.released = true;
    }
}
