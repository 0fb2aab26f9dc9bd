//! CPU drawing surfaces for the 2D renderer.

use std::path::Path;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::color::Color;
use crate::projection::Viewport;

/// Minimal fill API the 2D renderer draws through.
pub trait DrawableSurface {
    /// Logical size in pixels.
    fn size(&self) -> Viewport;
    /// Fill the whole surface with an opaque color.
    fn clear(&mut self, color: Color);
    /// Fill a simple polygon.
    fn fill_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32);
    /// Change the surface size, discarding its contents.
    fn resize(&mut self, width: u32, height: u32);
}

impl<T: DrawableSurface + ?Sized> DrawableSurface for Box<T> {
    fn size(&self) -> Viewport {
        (**self).size()
    }

    fn clear(&mut self, color: Color) {
        (**self).clear(color)
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32) {
        (**self).fill_polygon(points, color, alpha)
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        (**self).fill_circle(center, radius, color, alpha)
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }
}

/// [`DrawableSurface`] over an in-memory RGBA image.
///
/// Pixels are covered when their centre is inside the shape; coverage is
/// not antialiased. Fills blend source-over.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Write the current contents to disk; the format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        self.image.save(path)
    }

    /// Pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.image.width() && y < self.image.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Pixel-index bounds covering `[min, max]`, clipped to the image.
    fn clip_bounds(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        if w <= 0.0 || h <= 0.0 || !(min.is_finite() && max.is_finite()) {
            return None;
        }
        if max.x < 0.0 || max.y < 0.0 || min.x >= w || min.y >= h {
            return None;
        }
        let x0 = min.x.max(0.0).floor() as u32;
        let y0 = min.y.max(0.0).floor() as u32;
        let x1 = (max.x.ceil().min(w - 1.0)).max(0.0) as u32;
        let y1 = (max.y.ceil().min(h - 1.0)).max(0.0) as u32;
        Some((x0, y0, x1, y1))
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        let dst = self.image.get_pixel_mut(x, y);
        let a = alpha;
        let mix = |s: u8, d: u8| -> u8 {
            (s as f32 * a + d as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
        };
        let out_a = a + (dst[3] as f32 / 255.0) * (1.0 - a);
        *dst = Rgba([
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]);
    }
}

/// Even-odd test for a pixel centre against a closed polygon.
fn contains(points: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

impl DrawableSurface for ImageSurface {
    fn size(&self) -> Viewport {
        Viewport::new(self.image.width() as f32, self.image.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let fill = Rgba([color.r, color.g, color.b, 255]);
        for pixel in self.image.pixels_mut() {
            *pixel = fill;
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if points.len() < 3 || alpha == 0.0 {
            return;
        }
        let min = points.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
        let max = points.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);
        let Some((x0, y0, x1, y1)) = self.clip_bounds(min, max) else {
            return;
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if contains(points, center) {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if !(radius > 0.0) || alpha == 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) =
            self.clip_bounds(center - Vec2::splat(radius), center + Vec2::splat(radius))
        else {
            return;
        };

        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if p.distance_squared(center) <= r2 {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_is_opaque() {
        let mut surface = ImageSurface::new(4, 4);
        surface.clear(Color::BLACK);
        assert_eq!(surface.pixel(3, 3), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_circle_covers_center_only() {
        let mut surface = ImageSurface::new(20, 20);
        surface.clear(Color::BLACK);
        surface.fill_circle(Vec2::new(10.0, 10.0), 3.0, Color::WHITE, 1.0);
        assert_eq!(surface.pixel(10, 10), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(surface.pixel(0, 0), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(surface.pixel(15, 10), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_source_over_blend() {
        let mut surface = ImageSurface::new(4, 4);
        surface.clear(Color::BLACK);
        surface.fill_circle(Vec2::new(2.0, 2.0), 2.0, Color::WHITE, 0.5);
        let px = surface.pixel(2, 2).unwrap();
        assert!(px[0] == 127 || px[0] == 128);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_fill_polygon_square() {
        let mut surface = ImageSurface::new(10, 10);
        surface.clear(Color::BLACK);
        let square = [
            Vec2::new(2.0, 2.0),
            Vec2::new(6.0, 2.0),
            Vec2::new(6.0, 6.0),
            Vec2::new(2.0, 6.0),
        ];
        surface.fill_polygon(&square, Color::RED, 1.0);
        assert_eq!(surface.pixel(3, 3), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.pixel(5, 5), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.pixel(6, 6), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(surface.pixel(1, 3), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_save_png() {
        let mut surface = ImageSurface::new(6, 6);
        surface.clear(Color::RED);
        let path = std::env::temp_dir().join("sparkburst_surface_test.png");
        surface.save(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_offscreen_shapes_are_ignored() {
        let mut surface = ImageSurface::new(8, 8);
        surface.clear(Color::BLACK);
        surface.fill_circle(Vec2::new(-50.0, -50.0), 5.0, Color::WHITE, 1.0);
        surface.fill_circle(Vec2::new(f32::NAN, 2.0), 5.0, Color::WHITE, 1.0);
        surface.fill_polygon(&[Vec2::new(100.0, 100.0), Vec2::new(110.0, 100.0), Vec2::new(105.0, 110.0)], Color::WHITE, 1.0);
        assert!(surface.image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }
}
