use super::{Intersect, Trace, TraceImpl, AABB};
use crate::{
    geometry::{BasePlane, EPS},
    material::Surface,
    ray::Ray,
    textures::Texture,
};
use glam::DVec3;
use std::{cell::OnceCell, sync::Arc};

/// A plane, or a disk of `radius` around `center` when `radius >= EPS`
#[derive(Clone, Debug)]
pub struct Plane {
    pub center: DVec3,
    pub plane: BasePlane,
    pub radius: f64,
    /// In-plane axis the texture's x coordinate runs along
    surf_dir: DVec3,
    texture: Arc<dyn Texture>,
}

impl Plane {
    /// An infinite plane, textured relative to `plane.point`
    pub fn infinite(plane: BasePlane, texture: Arc<dyn Texture>) -> Self {
        Self::new(plane.point, plane, 0.0, texture)
    }

    pub fn disk(center: DVec3, normal: DVec3, radius: f64, texture: Arc<dyn Texture>) -> Self {
        Self::new(center, BasePlane::new(center, normal), radius, texture)
    }

    pub fn new(center: DVec3, plane: BasePlane, radius: f64, texture: Arc<dyn Texture>) -> Self {
        let surf_dir = Self::surf_dir(plane.normal);
        Self {
            center,
            plane,
            radius,
            surf_dir,
            texture,
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.radius < EPS
    }

    /// A unit vector lying in the plane: the normal rotated by 90° in the XY plane,
    /// or rotated in the YZ plane when the normal is along Z.
    fn surf_dir(normal: DVec3) -> DVec3 {
        let mut ret = DVec3::new(normal.y, -normal.x, 0.0);
        if ret.length_squared() < EPS * EPS {
            ret = DVec3::new(0.0, normal.z, -normal.y);
        }
        assert!(ret.length_squared() >= EPS * EPS, "plane normal must be nonzero");
        ret.normalize()
    }
}

impl Intersect for Plane {
    fn get_trace<'a>(&'a self, ray: &'a Ray, max_dist: Option<f64>) -> Option<Trace<'a>> {
        let max_dist = max_dist.filter(|d| *d >= 0.0);
        let trace = PlaneTrace::intersect(self, ray, max_dist)?;
        match max_dist {
            Some(max_dist) if trace.intersection_dist() >= max_dist => None,
            _ => Some(Trace::Plane(trace)),
        }
    }

    fn get_aabb(&self) -> Option<AABB> {
        if self.is_infinite() {
            return None;
        }
        // Per axis half extent of a disk is radius * sin(angle between normal and axis)
        let n = self.plane.normal;
        let half = self.radius
            * DVec3::new(
                (1.0 - n.x * n.x).max(0.0).sqrt(),
                (1.0 - n.y * n.y).max(0.0).sqrt(),
                (1.0 - n.z * n.z).max(0.0).sqrt(),
            );
        Some(AABB::new(self.center - half, self.center + half))
    }
}

#[derive(Debug)]
pub struct PlaneTrace<'a> {
    pub(super) plane: &'a Plane,
    ray: &'a Ray,
    dist_to_plane: f64,
    dir_dot_norm: f64,
    /// Unset until first asked for on an infinite plane; disks fill it while testing the radius
    inter_dist: OnceCell<f64>,
}

impl<'a> PlaneTrace<'a> {
    fn intersect(plane: &'a Plane, ray: &'a Ray, max_dist: Option<f64>) -> Option<Self> {
        let dist_to_plane = plane.plane.dist(ray.orig);
        // Source on the plane
        if dist_to_plane.abs() < EPS {
            return None;
        }
        // The hit can be no closer than the perpendicular distance
        if matches!(max_dist, Some(max_dist) if dist_to_plane.abs() > max_dist) {
            return None;
        }

        let dir_dot_norm = plane.plane.normal.dot(ray.dir);
        // Parallel to plane
        if dir_dot_norm.abs() < EPS {
            return None;
        }
        // Ray leaves plane
        if (dist_to_plane > 0.0) ^ (dir_dot_norm < 0.0) {
            return None;
        }

        let trace = Self {
            plane,
            ray,
            dist_to_plane,
            dir_dot_norm,
            inter_dist: OnceCell::new(),
        };

        if plane.is_infinite() {
            return Some(trace);
        }

        let inter_point = ray.get_dist(trace.intersection_dist());
        if (inter_point - plane.center).length() >= plane.radius {
            None
        } else {
            Some(trace)
        }
    }
}

impl TraceImpl for PlaneTrace<'_> {
    fn ray(&self) -> &Ray {
        self.ray
    }

    fn texture(&self) -> &dyn Texture {
        self.plane.texture.as_ref()
    }

    fn intersection_dist(&self) -> f64 {
        *self
            .inter_dist
            .get_or_init(|| -self.dist_to_plane / self.dir_dot_norm)
    }

    fn normal(&self) -> DVec3 {
        let normal = self.plane.plane.normal;
        if self.plane.plane.in_half_space(self.ray.orig) {
            normal
        } else {
            -normal
        }
    }

    fn transform_get_property(&self) -> Surface {
        let plane = self.plane;
        let diff = self.ray.get_dist(self.intersection_dist()) - plane.center;
        let x = diff.dot(plane.surf_dir);
        let y = diff.dot(plane.surf_dir.cross(plane.plane.normal));
        plane.texture.get_property(x, y)
    }
}
