//! Exact-form geometric helpers shared by the primitives, the k-d tree and the integrator

use glam::DVec3;

/// Tolerance for on-surface, parallel and zero-length tests
pub const EPS: f64 = 1e-6;

/// Refractive index of the medium rays start in
pub const AIR_DENSITY: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

pub trait GetAxis {
    type Output;

    fn axis(&self, axis: Axis) -> Self::Output;
}

impl GetAxis for DVec3 {
    type Output = f64;

    fn axis(&self, axis: Axis) -> Self::Output {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// An axis aligned plane, `axis = pos`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AAPlane {
    pub axis: Axis,
    pub pos: f64,
}

impl AAPlane {
    pub fn new(axis: Axis, pos: f64) -> Self {
        Self { axis, pos }
    }
}

/// An infinite plane through `point` with unit `normal`
#[derive(Clone, Copy, Debug)]
pub struct BasePlane {
    pub point: DVec3,
    pub normal: DVec3,
}

impl BasePlane {
    pub fn new(point: DVec3, normal: DVec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Signed distance from `p`, positive on the side the normal points to
    pub fn dist(&self, p: DVec3) -> f64 {
        (p - self.point).dot(self.normal)
    }

    pub fn in_half_space(&self, p: DVec3) -> bool {
        self.dist(p) > 0.0
    }
}

pub fn is_normalized(v: DVec3) -> bool {
    (v.length_squared() - 1.0).abs() < EPS
}

/// Mirror `v` about the axis given by the unit `normal`: `2(v·n)n - v`.
///
/// For an incoming direction `d` the reflected direction is `-reflection(n, d)`.
pub fn reflection(normal: DVec3, v: DVec3) -> DVec3 {
    2.0 * v.dot(normal) * normal - v
}

/// Refract the unit direction `v` through a surface whose unit `normal` faces the incoming side.
///
/// `ratio` is the refractive index of the medium entered divided by the index of the
/// medium left. Returns `None` on total internal reflection or when the result is not
/// a finite direction.
pub fn transmission(normal: DVec3, v: DVec3, ratio: f64) -> Option<DVec3> {
    let eta = 1.0 / ratio;
    let cos_i = -v.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);

    if k < 0.0 {
        return None;
    }

    let refracted = (eta * v + (eta * cos_i - k.sqrt()) * normal).normalize();
    if refracted.is_finite() {
        Some(refracted)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn reflect_about_normal() {
        let n = DVec3::Z;
        let d = DVec3::new(1.0, 0.0, -1.0).normalize();
        let out = -reflection(n, d);
        assert!(close(out, DVec3::new(1.0, 0.0, 1.0).normalize()));
    }

    #[test]
    fn transmission_with_equal_density_goes_straight() {
        let n = DVec3::Z;
        let d = DVec3::new(0.3, 0.4, -1.0).normalize();
        let t = transmission(n, d, 1.0).unwrap();
        assert!(close(t, d));
    }

    #[test]
    fn transmission_bends_towards_normal_in_denser_medium() {
        let n = DVec3::Z;
        let d = DVec3::new(1.0, 0.0, -1.0).normalize();
        let t = transmission(n, d, 1.5).unwrap();
        assert!(is_normalized(t));
        // Snell: sin(t) = sin(i) / 1.5
        let sin_t = t.x;
        assert!((sin_t - d.x / 1.5).abs() < 1e-9);
        assert!(t.z < 0.0);
    }

    #[test]
    fn total_internal_reflection() {
        let n = DVec3::Z;
        let d = DVec3::new(1.0, 0.0, -0.2).normalize();
        // Leaving glass into air at a grazing angle
        assert!(transmission(n, d, 1.0 / 1.5).is_none());
    }

    #[test]
    fn base_plane_distance() {
        let plane = BasePlane::new(DVec3::new(0.0, 0.0, 2.0), DVec3::new(0.0, 0.0, 3.0));
        assert_eq!(plane.normal, DVec3::Z);
        assert_eq!(plane.dist(DVec3::new(5.0, 1.0, 3.0)), 1.0);
        assert!(!plane.in_half_space(DVec3::ZERO));
    }

    #[test]
    fn axis_access() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        let picked: Vec<f64> = Axis::ALL.iter().map(|&a| v.axis(a)).collect();
        assert_eq!(picked, vec![1.0, 2.0, 3.0]);
    }
}
