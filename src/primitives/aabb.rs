use crate::{
    geometry::{AAPlane, Axis, GetAxis},
    ray::Ray,
};
use glam::DVec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// A box containing nothing, `min > max` on every axis
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(-f64::MAX),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    // Create a union AABB of two AABBs that surrounds both of them
    pub fn union(self, other: AABB) -> Self {
        AABB::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn point_union(self, other: DVec3) -> Self {
        AABB::new(self.min.min(other), self.max.max(other))
    }

    pub fn center(&self) -> DVec3 {
        0.5 * (self.min + self.max)
    }

    // Returns the axis which has greatest extent
    pub fn max_extent(&self) -> Axis {
        let extent = self.max - self.min;

        if extent.x > extent.y && extent.x > extent.z {
            Axis::X
        } else if extent.y > extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Cut the box in two along `plane`, returning the (lower, upper) halves
    pub fn split(&self, plane: AAPlane) -> (AABB, AABB) {
        let mut lower = *self;
        let mut upper = *self;
        match plane.axis {
            Axis::X => {
                lower.max.x = plane.pos;
                upper.min.x = plane.pos;
            }
            Axis::Y => {
                lower.max.y = plane.pos;
                upper.min.y = plane.pos;
            }
            Axis::Z => {
                lower.max.z = plane.pos;
                upper.min.z = plane.pos;
            }
        }
        (lower, upper)
    }

    /// Parametric interval `(t_near, t_far)` of the ray inside the box, clamped to `t >= 0`.
    ///
    /// Axes the ray does not move along only check that the origin lies in the slab,
    /// so zero direction components never produce NaN.
    pub fn clip(&self, ray: &Ray) -> Option<(f64, f64)> {
        let mut t_near = 0.0_f64;
        let mut t_far = f64::INFINITY;

        for axis in Axis::ALL {
            let orig = ray.orig.axis(axis);
            let dir = ray.dir.axis(axis);
            let (lo, hi) = (self.min.axis(axis), self.max.axis(axis));

            if dir == 0.0 {
                if orig < lo || orig > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let t1 = (lo - orig) * inv;
            let t2 = (hi - orig) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far {
            Some((t_near, t_far))
        } else {
            None
        }
    }
}
