//! The scene as the integrator sees it: primitives, lights and the acceleration tree.

use crate::{
    config::{KdTreeConfig, TraceConfig},
    geometry::{is_normalized, reflection, transmission, EPS},
    kdtree::KdTree,
    light::Light,
    material::{normalize_color, Color, BLACK},
    primitives::{Intersect, Primitive, Trace, AABB},
    ray::Ray,
};
use log::{debug, trace};

/// Counters collected while tracing, one per worker, merged at the end of a render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Calls to the integrator, including the terminated ones
    pub rays: u64,
    /// Deepest recursion level reached
    pub max_depth: u32,
}

impl RenderStats {
    pub fn merge(self, other: RenderStats) -> RenderStats {
        RenderStats {
            rays: self.rays + other.rays,
            max_depth: self.max_depth.max(other.max_depth),
        }
    }
}

pub struct Space {
    /// Every primitive of the scene, addressed by handle
    objs: Vec<Primitive>,
    /// Handles tested one by one: unbounded primitives, or all of them without a tree
    linear: Vec<usize>,
    tree: Option<KdTree>,
    lights: Vec<Light>,
    ambient: Color,
    config: TraceConfig,
    kdtree_config: KdTreeConfig,
    /// Region the scene lives in, the root of the tree covers at least this
    bound: AABB,
    initialized: bool,
}

impl Space {
    pub fn new(config: TraceConfig, kdtree_config: KdTreeConfig) -> Self {
        Self {
            objs: Vec::new(),
            linear: Vec::new(),
            tree: None,
            lights: Vec::new(),
            ambient: BLACK,
            config,
            kdtree_config,
            bound: AABB::empty(),
            initialized: false,
        }
    }

    /// Adds a primitive, returning its handle
    pub fn add_obj(&mut self, obj: impl Into<Primitive>) -> usize {
        assert!(!self.initialized, "cannot add primitives after init");
        self.objs.push(obj.into());
        self.objs.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        assert!(!self.initialized, "cannot add lights after init");
        self.lights.push(light);
    }

    pub fn set_bound(&mut self, bound: AABB) {
        self.bound = bound;
    }

    /// Prepares the scene for tracing. Must run exactly once, after every light and
    /// primitive is added.
    pub fn init(&mut self) {
        assert!(!self.initialized, "space initialized twice");
        assert!(!self.lights.is_empty(), "a scene needs at least one light");

        self.ambient = self.lights.iter().map(Light::power).sum::<Color>() * self.config.ambient_factor;

        let (bounded, unbounded): (Vec<usize>, Vec<usize>) =
            (0..self.objs.len()).partition(|&i| self.objs[i].get_aabb().is_some());

        let min_objects = self.kdtree_config.min_objects;
        if min_objects > 0 && bounded.len() >= min_objects {
            self.tree = Some(KdTree::new(&self.objs, &bounded, &self.bound, &self.kdtree_config));
            self.linear = unbounded;
        } else {
            self.linear = (0..self.objs.len()).collect();
        }

        debug!(
            "space initialized: {} primitives ({} tested linearly), {} lights, ambient {:?}",
            self.objs.len(),
            self.linear.len(),
            self.lights.len(),
            self.ambient
        );
        self.initialized = true;
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn objs(&self) -> &[Primitive] {
        &self.objs
    }

    /// Bounds of everything in the tree, `None` without a tree
    pub fn tree_aabb(&self) -> Option<AABB> {
        self.tree.as_ref().map(KdTree::get_aabb)
    }

    /// The nearest hit.
    ///
    /// The tree is searched before the unbounded primitives, so on equal distances a
    /// primitive in the tree wins over an unbounded one regardless of insertion order.
    pub fn find_first<'a>(&'a self, ray: &'a Ray) -> Option<Trace<'a>> {
        let mut ret = self
            .tree
            .as_ref()
            .and_then(|tree| tree.get_trace(&self.objs, ray, None));

        for &i in &self.linear {
            let limit = ret.as_ref().map(Trace::intersection_dist);
            if let Some(trace) = self.objs[i].get_trace(ray, limit) {
                ret = Some(trace);
            }
        }
        ret
    }

    /// The nearest hit, testing every primitive without the tree
    pub fn find_first_linear<'a>(&'a self, ray: &'a Ray) -> Option<Trace<'a>> {
        let mut min = f64::MAX;
        let mut ret = None;
        for obj in &self.objs {
            if let Some(trace) = obj.get_trace(ray, None) {
                let d = trace.intersection_dist();
                if d < min {
                    min = d;
                    ret = Some(trace);
                }
            }
        }
        ret
    }

    /// Whether anything is hit strictly closer than `dist`, stopping at the first hit
    pub fn find_any(&self, ray: &Ray, dist: f64) -> bool {
        self.linear
            .iter()
            .any(|&i| self.objs[i].get_trace(ray, Some(dist)).is_some())
            || self
                .tree
                .as_ref()
                .is_some_and(|tree| tree.find_any(&self.objs, ray, dist))
    }

    /// Color seen along `ray`, which has already travelled `dist` from the eye, at
    /// recursion level `depth`.
    pub fn trace(&self, ray: &Ray, dist: f64, depth: u32) -> Color {
        let mut stats = RenderStats::default();
        self.trace_with_stats(ray, dist, depth, &mut stats)
    }

    pub fn trace_with_stats(&self, ray: &Ray, mut dist: f64, depth: u32, stats: &mut RenderStats) -> Color {
        debug_assert!(self.initialized, "trace before init");
        stats.rays += 1;
        stats.max_depth = stats.max_depth.max(depth);
        if depth > self.config.max_depth {
            return BLACK;
        }

        assert!(ray.is_unit(), "ray direction {:?} is not normalized", ray.dir);

        let first_trace = match self.find_first(ray) {
            Some(trace) => trace,
            None => return BLACK,
        };

        let inter_dist = first_trace.intersection_dist();
        let norm = first_trace.normal();
        let inter_point = first_trace.intersection_point();
        let surf = first_trace.get_property();
        let density = first_trace.get_forward_density();
        assert!(is_normalized(norm), "surface normal {:?} is not normalized", norm);

        if ray.debug {
            trace!("depth {} hit {:?} at distance {}", depth, inter_point, inter_dist);
        }

        let config = &self.config;

        // Phong model
        let mut ret = surf.ambient * self.ambient;

        for light in &self.lights {
            let to_light = light.src - inter_point;
            let dist_to_light = to_light.length();
            let lm = to_light / dist_to_light;
            let lmn = lm.dot(norm);

            // Shadowed, go forward a little to leave the surface
            if self.find_any(&Ray::new(inter_point + lm * EPS, lm), dist_to_light) {
                if lmn > 0.0 {
                    ret += surf.diffuse * self.ambient * config.refl_decay;
                }
                continue;
            }

            let damping = (-dist_to_light * config.air_beer_density).exp();

            // Diffuse
            if lmn > 0.0 {
                ret += surf.diffuse * lmn * light.power() * damping;
            }

            // Specular
            let rmv = -reflection(norm, lm).dot(ray.dir);
            if rmv > 0.0 {
                ret += surf.specular * rmv.powf(surf.shininess) * light.power() * damping;
            }
        }

        // Beer-Lambert over the whole path
        dist += inter_dist;
        ret *= (-dist * config.air_beer_density).exp();

        // Reflected ray: go back a little, same density
        let refl_ray = Ray::with_density(inter_point - ray.dir * EPS, -reflection(norm, ray.dir), ray.density)
            .debugged(ray.debug);
        let cos = refl_ray.dir.dot(norm);
        let refl = self.trace_with_stats(&refl_ray, dist, depth + 1, stats);
        ret += refl * surf.diffuse * cos * config.refl_decay * surf.shininess;

        // Transmission
        if surf.transparency > 0.0 {
            if let Some(tr_dir) = transmission(norm, ray.dir, density / ray.density) {
                // Go forward a little, into the new medium
                let tr_ray = Ray::with_density(inter_point + ray.dir * EPS, tr_dir, density).debugged(ray.debug);
                let transm = self.trace_with_stats(&tr_ray, dist, depth + 1, stats);
                ret += transm * surf.transparency;
                ret *= config.transm_blend_factor;
            }
        }

        normalize_color(ret)
    }
}
