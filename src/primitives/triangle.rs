use super::{Intersect, Trace, TraceImpl, AABB};
use crate::{geometry::EPS, material::Surface, ray::Ray, textures::Texture};
use glam::DVec3;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: [DVec3; 3],
    e1: DVec3,
    e2: DVec3,
    normal: DVec3,
    texture: Arc<dyn Texture>,
}

impl Triangle {
    pub fn new(a: DVec3, b: DVec3, c: DVec3, texture: Arc<dyn Texture>) -> Self {
        let e1 = b - a;
        let e2 = c - a;
        let cross = e1.cross(e2);
        assert!(cross.length() >= EPS, "degenerate triangle");
        Self {
            vertices: [a, b, c],
            e1,
            e2,
            normal: cross.normalize(),
            texture,
        }
    }
}

impl Intersect for Triangle {
    // Möller–Trumbore
    fn get_trace<'a>(&'a self, ray: &'a Ray, max_dist: Option<f64>) -> Option<Trace<'a>> {
        let max_dist = max_dist.filter(|d| *d >= 0.0);
        let p = ray.dir.cross(self.e2);
        let det = self.e1.dot(p);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = ray.orig - self.vertices[0];
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.e1);
        let v = ray.dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let inter_dist = self.e2.dot(q) * inv_det;
        if inter_dist <= EPS || matches!(max_dist, Some(max_dist) if inter_dist >= max_dist) {
            return None;
        }

        Some(Trace::Triangle(TriangleTrace {
            triangle: self,
            ray,
            inter_dist,
        }))
    }

    fn get_aabb(&self) -> Option<AABB> {
        Some(
            self.vertices
                .iter()
                .fold(AABB::empty(), |b, &v| b.point_union(v)),
        )
    }
}

#[derive(Debug)]
pub struct TriangleTrace<'a> {
    pub(super) triangle: &'a Triangle,
    ray: &'a Ray,
    inter_dist: f64,
}

impl TraceImpl for TriangleTrace<'_> {
    fn ray(&self) -> &Ray {
        self.ray
    }

    fn texture(&self) -> &dyn Texture {
        self.triangle.texture.as_ref()
    }

    fn intersection_dist(&self) -> f64 {
        self.inter_dist
    }

    fn normal(&self) -> DVec3 {
        let normal = self.triangle.normal;
        if normal.dot(self.ray.dir) > 0.0 {
            -normal
        } else {
            normal
        }
    }

    fn transform_get_property(&self) -> Surface {
        let triangle = self.triangle;
        let x_axis = triangle.e1.normalize();
        let y_axis = triangle.normal.cross(x_axis);
        let diff = self.ray.get_dist(self.inter_dist) - triangle.vertices[0];
        triangle.texture.get_property(diff.dot(x_axis), diff.dot(y_axis))
    }
}
