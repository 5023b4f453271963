//! Grayscale-to-colour rendering of height fields for presentation layers.
//!
//! Pure functions: a field goes in, row-major RGBA pixels come out. Nothing
//! here touches the streaming engine.

use crate::heightmap::HeightField;

/// An RGBA colour.
pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];

/// Row-major RGBA pixels, four bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl HeightTexture {
    /// A fully transparent black texture.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, colour: Rgba) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&colour);
    }

    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Linear blend of two colours, `t` clamped to `[0, 1]`.
pub fn lerp_colour(low: Rgba, high: Rgba, t: f32) -> Rgba {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mut out = [0u8; 4];
    for (o, (a, b)) in out.iter_mut().zip(low.iter().zip(high.iter())) {
        *o = (*a as f32 + (*b as f32 - *a as f32) * t).round() as u8;
    }
    out
}

/// Remap `value` from `[min, max]` to `[0, 1]`; a flat range maps to 0.
pub fn inverse_lerp(min: f32, max: f32, value: f32) -> f32 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Render `field` by remapping its own min/max onto `low..high`.
pub fn texture_from_height_field(field: &HeightField, low: Rgba, high: Rgba) -> HeightTexture {
    texture_from_values(field.values(), field.size(), low, high, field.min(), field.max())
}

/// Render a `size x size` row-major grid with an explicit value range.
pub fn texture_from_values(
    values: &[f32],
    size: usize,
    low: Rgba,
    high: Rgba,
    min: f32,
    max: f32,
) -> HeightTexture {
    let mut texture = HeightTexture::new(size as u32, size as u32);
    for y in 0..size {
        for x in 0..size {
            let t = inverse_lerp(min, max, values[y * size + x]);
            texture.set_pixel(x as u32, y as u32, lerp_colour(low, high, t));
        }
    }
    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_map_to_gradient_ends() {
        let field = HeightField::from_values(2, vec![-4.0, 0.0, 2.0, 6.0], Vec::new());
        let texture = texture_from_height_field(&field, BLACK, WHITE);
        assert_eq!(texture.dimensions(), (2, 2));
        assert_eq!(texture.get_pixel(0, 0), BLACK);
        assert_eq!(texture.get_pixel(1, 1), WHITE);
        assert_eq!(texture.get_pixel(1, 0), [102, 102, 102, 255]);
    }

    #[test]
    fn test_flat_field_is_low_colour() {
        let field = HeightField::zeros(3);
        let magenta = [255, 0, 255, 255];
        let texture = texture_from_height_field(&field, magenta, WHITE);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(texture.get_pixel(x, y), magenta);
            }
        }
    }

    #[test]
    fn test_explicit_range_clamps() {
        let texture = texture_from_values(&[-1.0, 0.5, 2.0, 1.0], 2, BLACK, WHITE, 0.0, 1.0);
        assert_eq!(texture.get_pixel(0, 0), BLACK);
        assert_eq!(texture.get_pixel(1, 0), [128, 128, 128, 255]);
        assert_eq!(texture.get_pixel(0, 1), WHITE);
    }

    #[test]
    fn test_set_get_pixel_roundtrip() {
        let mut texture = HeightTexture::new(4, 4);
        texture.set_pixel(2, 3, [10, 20, 30, 40]);
        assert_eq!(texture.get_pixel(2, 3), [10, 20, 30, 40]);
        assert_eq!(texture.pixels.len(), 64);
    }
}
