use crate::geometry::{is_normalized, AIR_DENSITY};
use glam::DVec3;

/// The ray data type
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub orig: DVec3,
    /// Unit direction
    pub dir: DVec3,
    /// Refractive index of the medium the ray currently travels through
    pub density: f64,
    /// Debug rays log every hit point they produce
    pub debug: bool,
}

impl Ray {
    /// Creates a ray travelling through air
    pub fn new(orig: DVec3, dir: DVec3) -> Self {
        Self::with_density(orig, dir, AIR_DENSITY)
    }

    pub fn with_density(orig: DVec3, dir: DVec3, density: f64) -> Self {
        Self {
            orig,
            dir,
            density,
            debug: false,
        }
    }

    pub fn debugged(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn get_dist(&self, t: f64) -> DVec3 {
        self.orig + t * self.dir
    }

    pub fn is_unit(&self) -> bool {
        is_normalized(self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_along_ray() {
        let ray = Ray::new(DVec3::new(1.0, 2.0, 3.0), DVec3::X);
        assert_eq!(ray.get_dist(2.5), DVec3::new(3.5, 2.0, 3.0));
        assert_eq!(ray.density, AIR_DENSITY);
        assert!(ray.is_unit());
        assert!(!Ray::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)).is_unit());
    }
}
