//! CPU renderer drawing particles as filled shapes.
//!
//! Particles in front of the `z = 0` plane are drawn as hexagons dimmed by
//! depth; the rest are plain circles. Sprites are drawn in input order, so
//! sort them back to front first.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::color::Color;
use crate::error::RenderError;
use crate::particle::Sprite;
use crate::projection::{Projector, Viewport};
use crate::surface::DrawableSurface;

const HEXAGON_SIDES: usize = 6;

pub struct Canvas2dRenderer<S: DrawableSurface> {
    surface: S,
    background: Color,
    released: bool,
}

impl<S: DrawableSurface> Canvas2dRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            background: Color::BLACK,
            released: false,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.surface.size()
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.released {
            Err(RenderError::Released)
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.surface.clear(self.background);
        Ok(())
    }

    /// Draw one sprite. Returns `false` if it could not be projected.
    pub fn draw_particle<T: Sprite + ?Sized>(
        &mut self,
        sprite: &T,
        projector: &Projector<'_>,
    ) -> Result<bool, RenderError> {
        self.ensure_live()?;
        let position = sprite.position();
        let projected = match projector.project(position, sprite.size(), self.viewport()) {
            Ok(p) => p,
            Err(e) => {
                log::trace!("skipping sprite at {:?}: {}", position, e);
                return Ok(false);
            }
        };
        let center = Vec2::new(projected.x, projected.y);

        if position.z < 0.0 {
            let step = TAU / HEXAGON_SIDES as f32;
            let hexagon: Vec<Vec2> = (0..HEXAGON_SIDES)
                .map(|i| {
                    let (sin, cos) = (step * i as f32).sin_cos();
                    center + Vec2::new(cos, sin) * projected.size
                })
                .collect();
            let depth_alpha = (0.8 - projected.z_factor * 0.6).max(0.2);
            self.surface
                .fill_polygon(&hexagon, sprite.color(), sprite.alpha() * depth_alpha);
        } else {
            self.surface
                .fill_circle(center, projected.size, sprite.color(), sprite.alpha());
        }
        Ok(true)
    }

    /// Draw every sprite in order. Returns how many were drawn.
    pub fn draw_particles_batch<T: Sprite>(
        &mut self,
        sprites: &[T],
        projector: &Projector<'_>,
    ) -> Result<usize, RenderError> {
        let mut drawn = 0;
        for sprite in sprites {
            if self.draw_particle(sprite, projector)? {
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.surface
            .resize(viewport.width.max(0.0) as u32, viewport.height.max(0.0) as u32);
    }

    /// Stop drawing. Further calls do nothing.
    pub fn cleanup(&mut self) {
        if !self.released {
            log::debug!("releasing 2D renderer");
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::SpriteData;
    use crate::surface::ImageSurface;
    use glam::Vec3;
    use image::Rgba;

    const PERSPECTIVE: Projector<'static> = Projector::Perspective { perspective: 1000.0 };

    fn sprite(position: Vec3, alpha: f32) -> SpriteData {
        SpriteData {
            position,
            color: Color::WHITE,
            size: 4.0,
            alpha,
        }
    }

    #[test]
    fn test_clear_fills_black() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(8, 8));
        r.clear().unwrap();
        assert!(r.surface().image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_far_particle_is_circle_with_plain_alpha() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(100, 100));
        r.clear().unwrap();
        let drawn = r
            .draw_particles_batch(&[sprite(Vec3::new(50.0, 50.0, 0.0), 1.0)], &PERSPECTIVE)
            .unwrap();
        assert_eq!(drawn, 1);
        assert_eq!(r.surface().pixel(50, 50), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(r.surface().pixel(56, 50), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_close_particle_is_dimmed() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(100, 100));
        r.clear().unwrap();
        // z = -500: z_factor 0.5, depth alpha max(0.2, 0.8 - 0.3) = 0.5
        r.draw_particle(&sprite(Vec3::new(50.0, 50.0, -500.0), 1.0), &PERSPECTIVE)
            .unwrap();
        let px = r.surface().pixel(50, 50).unwrap();
        assert!(px[0] == 127 || px[0] == 128, "{:?}", px);
    }

    #[test]
    fn test_unprojectable_is_skipped() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(10, 10));
        let drawn = r
            .draw_particles_batch(&[sprite(Vec3::new(5.0, 5.0, -1000.0), 1.0)], &PERSPECTIVE)
            .unwrap();
        assert_eq!(drawn, 0);
    }

    #[test]
    fn test_cleanup_then_draw() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(10, 10));
        r.cleanup();
        r.cleanup();
        assert!(matches!(r.clear(), Err(RenderError::Released)));
    }

    #[test]
    fn test_resize() {
        let mut r = Canvas2dRenderer::new(ImageSurface::new(10, 10));
        r.resize(Viewport::new(32.0, 16.0));
        assert_eq!(r.viewport(), Viewport::new(32.0, 16.0));
    }
}
