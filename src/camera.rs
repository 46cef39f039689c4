use crate::{config::CameraConfig, ray::Ray};
use glam::DVec3;

/// A pinhole camera
#[derive(Debug)]
pub struct Camera {
    origin: DVec3,
    lower_left_corner: DVec3,
    horizontal: DVec3,
    vertical: DVec3,
}

impl Camera {
    pub fn new(origin: DVec3, target: DVec3, up: DVec3, vfov: f64, aspect: f64) -> Self {
        let theta = vfov.to_radians();
        let half_height = f64::tan(theta / 2.0);
        let half_width = aspect * half_height;
        let w = (origin - target).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);
        let lower_left_corner = origin - half_width * u - half_height * v - w;
        let horizontal = 2.0 * half_width * u;
        let vertical = 2.0 * half_height * v;

        Self {
            origin,
            lower_left_corner,
            horizontal,
            vertical,
        }
    }

    pub fn from_config(config: &CameraConfig, aspect: f64) -> Self {
        Self::new(config.eye, config.target, config.up, config.fov, aspect)
    }

    /// Ray through the image plane at (`s`, `t`), both in [0, 1] from the lower left corner
    pub fn ray(&self, s: f64, t: f64) -> Ray {
        let dir = self.lower_left_corner + s * self.horizontal + t * self.vertical - self.origin;
        Ray::new(self.origin, dir.normalize())
    }
}
