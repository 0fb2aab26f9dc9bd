//! 8-bit RGB colors and the particle palette.

use rand::Rng;

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels divided by 255, ready for GPU upload.
    #[inline]
    pub fn normalized(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Shades a particle may take when it is picked as "red".
pub const RED_VARIANTS: [Color; 5] = [
    Color::rgb(255, 0, 0),
    Color::rgb(255, 50, 50),
    Color::rgb(200, 0, 0),
    Color::rgb(255, 100, 100),
    Color::rgb(180, 0, 0),
];

/// Pick a particle color: with probability `red_chance` a uniform pick
/// from [`RED_VARIANTS`], white otherwise.
pub fn pick_particle_color<R: Rng + ?Sized>(rng: &mut R, red_chance: f32) -> Color {
    if rng.gen::<f32>() < red_chance {
        RED_VARIANTS[rng.gen_range(0..RED_VARIANTS.len())]
    } else {
        Color::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_normalized() {
        let [r, g, b] = Color::rgb(255, 0, 51).normalized();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_pick_color_extremes() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(pick_particle_color(&mut rng, 0.0), Color::WHITE);
            assert!(RED_VARIANTS.contains(&pick_particle_color(&mut rng, 1.0)));
        }
    }
}
