//! Surface properties over 2D surface coordinates.
//!
//! Primitives project their hit point to `(x, y)` coordinates and ask their texture
//! for the [`Surface`] there.

use crate::material::{Color, Surface};
use glam::DVec3;
use image::RgbImage;

pub trait Texture: Send + Sync + std::fmt::Debug {
    fn get_property(&self, x: f64, y: f64) -> Surface;

    /// The surface everywhere, for textures that do not depend on the coordinates.
    /// Lets primitives skip projecting the hit point.
    fn uniform(&self) -> Option<Surface> {
        None
    }
}

/// A texture with a constant uniform surface
#[derive(Debug)]
pub struct UniformTexture {
    surface: Surface,
}

impl UniformTexture {
    pub fn new(surface: Surface) -> Self {
        Self { surface }
    }
}

impl Texture for UniformTexture {
    fn get_property(&self, _x: f64, _y: f64) -> Surface {
        self.surface
    }

    fn uniform(&self) -> Option<Surface> {
        Some(self.surface)
    }
}

/// Checkerboard of two surfaces with square cells of side `size`
#[derive(Debug)]
pub struct GridTexture {
    size: f64,
    odd: Surface,
    even: Surface,
}

impl GridTexture {
    pub fn new(size: f64, odd: Surface, even: Surface) -> Self {
        assert!(size > 0.0, "grid cell size must be positive");
        Self { size, odd, even }
    }
}

impl Texture for GridTexture {
    fn get_property(&self, x: f64, y: f64) -> Surface {
        let cx = (x / self.size).floor() as i64;
        let cy = (y / self.size).floor() as i64;
        if (cx + cy).rem_euclid(2) == 1 {
            self.odd
        } else {
            self.even
        }
    }
}

/// Tiles an image over the surface, one pixel per `scale` units, as the diffuse
/// and ambient color of `base`
#[derive(Debug)]
pub struct ImageTexture {
    image: RgbImage,
    scale: f64,
    base: Surface,
}

impl ImageTexture {
    pub fn new(image: RgbImage, scale: f64, base: Surface) -> Self {
        assert!(image.width() > 0 && image.height() > 0, "empty texture image");
        assert!(scale > 0.0, "texture scale must be positive");
        Self { image, scale, base }
    }

    fn pixel(&self, x: f64, y: f64) -> Color {
        let u = ((x / self.scale).floor() as i64).rem_euclid(self.image.width() as i64) as u32;
        let v = ((y / self.scale).floor() as i64).rem_euclid(self.image.height() as i64) as u32;

        let [r, g, b] = self.image.get_pixel(u, v).0;

        DVec3::new(r as f64, g as f64, b as f64) / 255.0
    }
}

impl Texture for ImageTexture {
    fn get_property(&self, x: f64, y: f64) -> Surface {
        let color = self.pixel(x, y);
        Surface {
            ambient: color * self.base.ambient,
            diffuse: color * self.base.diffuse,
            ..self.base
        }
    }
}
