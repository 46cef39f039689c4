use crate::material::Color;
use glam::DVec3;

/// A point light
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub src: DVec3,
    pub color: Color,
    pub intensity: f64,
}

impl Light {
    pub fn new(src: DVec3, color: Color, intensity: f64) -> Self {
        Self {
            src,
            color,
            intensity,
        }
    }

    /// Color scaled by intensity
    pub fn power(&self) -> Color {
        self.color * self.intensity
    }
}
