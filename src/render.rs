//! Dispatches one integrator call per pixel over rayon's thread pool.

use crate::{
    camera::Camera,
    error::Result,
    material::Color,
    space::{RenderStats, Space},
};
use image::RgbImage;
use rayon::prelude::*;
use std::path::Path;

/// Linear colors of a rendered image, rows from the top
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Frame {
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.get(x, y).clamp(Color::ZERO, Color::ONE);
            // Convert from [0, 1] to [0, 256)
            image::Rgb([
                (255.99 * c.x) as u8,
                (255.99 * c.y) as u8,
                (255.99 * c.z) as u8,
            ])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }
}

/// Render `space` as seen by `camera`, sampling each pixel at its centre
pub fn render(space: &Space, camera: &Camera, width: u32, height: u32) -> (Frame, RenderStats) {
    let mut pixels = vec![Color::ZERO; width as usize * height as usize];

    let stats = pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .map(|(row, line)| {
            let mut stats = RenderStats::default();
            // Image rows run top down, the camera's t bottom up
            let t = (height as f64 - row as f64 - 0.5) / height as f64;
            for (x, pixel) in line.iter_mut().enumerate() {
                let s = (x as f64 + 0.5) / width as f64;
                let ray = camera.ray(s, t);
                *pixel = space.trace_with_stats(&ray, 0.0, 0, &mut stats);
            }
            stats
        })
        .reduce(RenderStats::default, RenderStats::merge);

    (
        Frame {
            width,
            height,
            pixels,
        },
        stats,
    )
}
