//! Texture sampling for shaders.
//!
//! Decoding is delegated to the `image` crate, so diffuse and normal maps
//! can be TGA, PNG, or anything else it understands; sampling is
//! nearest-neighbor with repeat wrapping.

use std::path::Path;

use crate::tga::Color;

/// A 2D texture holding RGBA pixels.
#[derive(Debug)]
pub struct Texture {
    data: Vec<Color>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Loads a texture from an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        let data = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                Color::rgba(r, g, b, a)
            })
            .collect();

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a texture from pre-filled pixels, row-major, top row first.
    pub fn from_pixels(data: Vec<Color>, width: u32, height: u32) -> Self {
        assert_eq!(data.len(), (width * height) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Samples the texture at UV coordinates using nearest-neighbor
    /// filtering.
    ///
    /// UVs use the OBJ convention with the origin at the bottom-left, so V
    /// is flipped against the top-left pixel storage. Coordinates outside
    /// `[0, 1]` wrap (`rem_euclid` handles negatives).
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let u = u.rem_euclid(1.0);
        let v = (1.0 - v).rem_euclid(1.0);

        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        let y = ((v * self.height as f64) as u32).min(self.height - 1);

        self.data[(y * self.width + x) as usize]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
