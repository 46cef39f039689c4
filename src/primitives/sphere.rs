use super::{Intersect, Trace, TraceImpl, AABB};
use crate::{
    geometry::{AIR_DENSITY, EPS},
    material::Surface,
    ray::Ray,
    textures::Texture,
};
use glam::DVec3;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Sphere {
    center: DVec3,
    radius: f64,
    /// Refractive index of the inside
    density: f64,
    /// Texture axes: latitude is measured from `north`, longitude from `east`
    north: DVec3,
    east: DVec3,
    texture: Arc<dyn Texture>,
}

impl Sphere {
    pub fn new(center: DVec3, radius: f64, texture: Arc<dyn Texture>) -> Self {
        Self::with_density(center, radius, AIR_DENSITY, texture)
    }

    pub fn with_density(center: DVec3, radius: f64, density: f64, texture: Arc<dyn Texture>) -> Self {
        assert!(radius >= EPS, "sphere radius must be positive");
        Self {
            center,
            radius,
            density,
            north: DVec3::Z,
            east: DVec3::X,
            texture,
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Intersect for Sphere {
    fn get_trace<'a>(&'a self, ray: &'a Ray, max_dist: Option<f64>) -> Option<Trace<'a>> {
        let max_dist = max_dist.filter(|d| *d >= 0.0);
        let oc = self.center - ray.orig;
        let tca = oc.dot(ray.dir);
        let d2 = oc.length_squared() - tca * tca;
        let r2 = self.radius * self.radius;
        if d2 > r2 {
            return None;
        }

        let thc = (r2 - d2).sqrt();
        let (near, far) = (tca - thc, tca + thc);
        let (inter_dist, inside) = if near > EPS {
            (near, false)
        } else if far > EPS {
            (far, true)
        } else {
            return None;
        };

        if matches!(max_dist, Some(max_dist) if inter_dist >= max_dist) {
            return None;
        }

        Some(Trace::Sphere(SphereTrace {
            sphere: self,
            ray,
            inter_dist,
            inside,
        }))
    }

    fn get_aabb(&self) -> Option<AABB> {
        Some(AABB::new(
            self.center - DVec3::splat(self.radius),
            self.center + DVec3::splat(self.radius),
        ))
    }
}

#[derive(Debug)]
pub struct SphereTrace<'a> {
    pub(super) sphere: &'a Sphere,
    ray: &'a Ray,
    inter_dist: f64,
    /// The ray starts inside the sphere and hits it on the way out
    inside: bool,
}

impl SphereTrace<'_> {
    fn outward_normal(&self) -> DVec3 {
        (self.ray.get_dist(self.inter_dist) - self.sphere.center).normalize()
    }
}

impl TraceImpl for SphereTrace<'_> {
    fn ray(&self) -> &Ray {
        self.ray
    }

    fn texture(&self) -> &dyn Texture {
        self.sphere.texture.as_ref()
    }

    fn intersection_dist(&self) -> f64 {
        self.inter_dist
    }

    fn normal(&self) -> DVec3 {
        let normal = self.outward_normal();
        if self.inside {
            -normal
        } else {
            normal
        }
    }

    fn get_forward_density(&self) -> f64 {
        if self.inside {
            AIR_DENSITY
        } else {
            self.sphere.density
        }
    }

    fn transform_get_property(&self) -> Surface {
        let sphere = self.sphere;
        let normal = self.outward_normal();
        let lat = normal.dot(sphere.north).clamp(-1.0, 1.0).acos();
        let lon = normal.dot(sphere.north.cross(sphere.east)).atan2(normal.dot(sphere.east));
        sphere.texture.get_property(lon * sphere.radius, lat * sphere.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{material::WHITE, textures::UniformTexture};
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256Plus;

    fn ball(density: f64) -> Sphere {
        let texture = Arc::new(UniformTexture::new(Surface::matte(WHITE)));
        Sphere::with_density(DVec3::ZERO, 1.0, density, texture)
    }

    #[test]
    fn hit_from_outside() {
        let sphere = ball(1.5);
        let ray = Ray::new(DVec3::new(0.0, 0.0, 3.0), -DVec3::Z);
        let trace = sphere.get_trace(&ray, None).unwrap();
        assert!((trace.intersection_dist() - 2.0).abs() < EPS);
        assert_eq!(trace.normal(), DVec3::Z);
        assert_eq!(trace.get_forward_density(), 1.5);
    }

    #[test]
    fn hit_from_inside_faces_inward() {
        let sphere = ball(1.5);
        let ray = Ray::with_density(DVec3::ZERO, DVec3::X, 1.5);
        let trace = sphere.get_trace(&ray, None).unwrap();
        assert!((trace.intersection_dist() - 1.0).abs() < EPS);
        assert_eq!(trace.normal(), -DVec3::X);
        assert_eq!(trace.get_forward_density(), AIR_DENSITY);
    }

    #[test]
    fn misses() {
        let sphere = ball(1.0);
        assert!(sphere.get_trace(&Ray::new(DVec3::new(0.0, 2.0, 3.0), -DVec3::Z), None).is_none());
        // Sphere behind the ray
        assert!(sphere.get_trace(&Ray::new(DVec3::new(0.0, 0.0, 3.0), DVec3::Z), None).is_none());
        // Closer than max_dist only
        let ray = Ray::new(DVec3::new(0.0, 0.0, 3.0), -DVec3::Z);
        assert!(sphere.get_trace(&ray, Some(2.0)).is_none());
        assert!(sphere.get_trace(&ray, Some(2.5)).is_some());
        // Negative means unbounded
        assert!(sphere.get_trace(&ray, Some(-1.0)).is_some());
    }

    #[test]
    fn random_hits_lie_on_sphere() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        let sphere = ball(1.0);
        for _ in 0..1000 {
            let orig = DVec3::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0));
            let target = DVec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            let dir = (target - orig).normalize();
            let ray = Ray::new(orig, dir);
            if let Some(trace) = sphere.get_trace(&ray, None) {
                assert!((trace.intersection_point().length() - 1.0).abs() < 1e-9);
                assert!(trace.normal().dot(dir) <= 0.0);
            }
        }
    }
}
