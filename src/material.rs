use glam::DVec3;

/// RGB color, each channel nominally in [0, 1]
pub type Color = DVec3;

pub const BLACK: Color = DVec3::ZERO;
pub const WHITE: Color = DVec3::ONE;

/// Optical properties of a surface at a single point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// Phong exponent and mirror weight, in [0, 1]
    pub shininess: f64,
    /// Weight of the transmitted ray, 0 for opaque surfaces
    pub transparency: f64,
}

impl Surface {
    pub fn new(ambient: Color, diffuse: Color, specular: Color, shininess: f64, transparency: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&shininess));
        debug_assert!(transparency >= 0.0);
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
            transparency,
        }
    }

    /// A matte surface of a single color
    pub fn matte(color: Color) -> Self {
        Self::new(color, color, 0.1 * WHITE, 0.2, 0.0)
    }

    pub fn glass() -> Self {
        Self::new(0.05 * WHITE, 0.05 * WHITE, WHITE, 0.5, 0.8)
    }

    pub fn mirror(tint: Color) -> Self {
        Self::new(0.1 * tint, tint, WHITE, 1.0, 0.0)
    }
}

/// Clamp negative channels to zero and scale the color down uniformly when the
/// brightest channel exceeds one.
pub fn normalize_color(color: Color) -> Color {
    let color = color.max(BLACK);
    let max = color.max_element();
    if max > 1.0 {
        color / max
    } else {
        color
    }
}
