//! This module is full of primitives that all impl Intersect

mod aabb;
mod plane;
mod sphere;
mod triangle;

pub use aabb::*;
pub use plane::*;
pub use sphere::*;
pub use triangle::*;

use crate::{material::Surface, ray::Ray, textures::Texture};
use enum_dispatch::enum_dispatch;
use glam::DVec3;

/// Computes whether a ray intersects a primitive
#[enum_dispatch]
pub trait Intersect {
    /// Intersects the ray with the primitive.
    ///
    /// With `max_dist` given, only a hit strictly closer than it is returned. A negative
    /// `max_dist` counts as unbounded.
    fn get_trace<'a>(&'a self, ray: &'a Ray, max_dist: Option<f64>) -> Option<Trace<'a>>;

    /// Bounds of the primitive, `None` if it is unbounded
    fn get_aabb(&self) -> Option<AABB>;
}

/// Every renderable surface kind
#[enum_dispatch(Intersect)]
#[derive(Clone, Debug)]
pub enum Primitive {
    Plane,
    Sphere,
    Triangle,
}

/// Per variant behaviour of a trace.
///
/// Only the distance and the normal are variant specific; everything else derives
/// from them.
trait TraceImpl {
    fn ray(&self) -> &Ray;

    fn texture(&self) -> &dyn Texture;

    fn intersection_dist(&self) -> f64;

    /// Unit normal facing the side the ray comes from
    fn normal(&self) -> DVec3;

    /// Project the hit point to surface coordinates and look up the texture there
    fn transform_get_property(&self) -> Surface;

    /// Refractive index of the medium behind the surface
    fn get_forward_density(&self) -> f64 {
        self.ray().density
    }
}

/// The result of a successful ray-primitive query.
///
/// Borrows the ray and the primitive and lives only as long as the caller needs it.
/// Fields that are not needed to decide the hit are computed on first access.
#[derive(Debug)]
pub enum Trace<'a> {
    Plane(PlaneTrace<'a>),
    Sphere(SphereTrace<'a>),
    Triangle(TriangleTrace<'a>),
}

impl<'a> Trace<'a> {
    fn inner(&self) -> &dyn TraceImpl {
        match self {
            Trace::Plane(t) => t,
            Trace::Sphere(t) => t,
            Trace::Triangle(t) => t,
        }
    }

    pub fn ray(&self) -> &Ray {
        self.inner().ray()
    }

    pub fn intersection_dist(&self) -> f64 {
        self.inner().intersection_dist()
    }

    pub fn intersection_point(&self) -> DVec3 {
        self.ray().get_dist(self.intersection_dist())
    }

    pub fn normal(&self) -> DVec3 {
        self.inner().normal()
    }

    pub fn get_forward_density(&self) -> f64 {
        self.inner().get_forward_density()
    }

    /// Surface at the hit point; uniform textures skip the projection
    pub fn get_property(&self) -> Surface {
        let inner = self.inner();
        inner
            .texture()
            .uniform()
            .unwrap_or_else(|| inner.transform_get_property())
    }

    pub fn transform_get_property(&self) -> Surface {
        self.inner().transform_get_property()
    }

    /// Whether both traces hit the very same primitive
    pub fn same_primitive(&self, other: &Trace<'_>) -> bool {
        match (self, other) {
            (Trace::Plane(a), Trace::Plane(b)) => std::ptr::eq(a.plane, b.plane),
            (Trace::Sphere(a), Trace::Sphere(b)) => std::ptr::eq(a.sphere, b.sphere),
            (Trace::Triangle(a), Trace::Triangle(b)) => std::ptr::eq(a.triangle, b.triangle),
            _ => false,
        }
    }
}
