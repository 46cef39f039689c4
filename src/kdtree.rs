use crate::{
    config::KdTreeConfig,
    geometry::{AAPlane, GetAxis},
    primitives::{Intersect, Primitive, Trace, AABB},
    ray::Ray,
};
use log::debug;
use smallvec::SmallVec;

/// A primitive handle together with its bounds
#[derive(Clone, Copy, Debug)]
struct RenderWrapper {
    obj: usize,
    aabb: AABB,
}

/// A k-d tree over the bounded primitives of a scene.
///
/// The tree stores handles into the primitive slice it was built from; the same slice
/// must be passed back to [`KdTree::get_trace`].
pub struct KdTree {
    /// Flattened nodes, the root first
    tree: Vec<FlatNode>,
    bounds: AABB,
    depth: usize,
}

impl KdTree {
    /// Builds a tree over `objs[handle]` for every handle.
    ///
    /// `space` is the region the scene lives in; the root covers it together with the
    /// bounds of every primitive. Panics if a primitive is unbounded.
    pub fn new(objs: &[Primitive], handles: &[usize], space: &AABB, config: &KdTreeConfig) -> Self {
        let wrappers = handles
            .iter()
            .map(|&obj| {
                let aabb = objs[obj]
                    .get_aabb()
                    .unwrap_or_else(|| panic!("primitive {} has no bounding box", obj));
                RenderWrapper { obj, aabb }
            })
            .collect::<Vec<_>>();

        let bounds = wrappers
            .iter()
            .fold(AABB::empty(), |b, w| b.union(w.aabb));
        let root_bounds = if space.is_empty() { bounds } else { bounds.union(*space) };

        let mut total_nodes = 0;
        let mut depth = 0;
        let root = Self::build(wrappers, root_bounds, 0, config, &mut total_nodes, &mut depth);
        let tree = Self::flatten(root, total_nodes);

        let leaves = tree
            .iter()
            .filter(|node| matches!(node.inner, FlatNodeInner::Leaf { .. }))
            .count();
        debug!(
            "k-d tree built over {} primitives: {} nodes, {} leaves, depth {}",
            handles.len(),
            total_nodes,
            leaves,
            depth
        );

        Self { tree, bounds, depth }
    }

    fn build(
        objs: Vec<RenderWrapper>,
        bounds: AABB,
        depth: usize,
        config: &KdTreeConfig,
        total_nodes: &mut usize,
        max_depth_seen: &mut usize,
    ) -> BuildNode {
        *total_nodes += 1;
        *max_depth_seen = (*max_depth_seen).max(depth);

        if objs.len() <= config.leaf_size.max(1) || depth >= config.max_depth {
            return BuildNode::leaf(bounds, objs);
        }

        let plane = Self::cut(&objs, &bounds);
        let axis = plane.axis;

        // Straddling primitives go to both sides
        let left = objs
            .iter()
            .filter(|w| w.aabb.min.axis(axis) <= plane.pos)
            .copied()
            .collect::<Vec<_>>();
        let right = objs
            .iter()
            .filter(|w| w.aabb.max.axis(axis) >= plane.pos)
            .copied()
            .collect::<Vec<_>>();

        // The split separates nothing
        if left.len() == objs.len() && right.len() == objs.len() {
            return BuildNode::leaf(bounds, objs);
        }

        let (left_bounds, right_bounds) = bounds.split(plane);
        let left = Box::new(Self::build(left, left_bounds, depth + 1, config, total_nodes, max_depth_seen));
        let right = Box::new(Self::build(right, right_bounds, depth + 1, config, total_nodes, max_depth_seen));

        BuildNode::interior(bounds, plane, left, right)
    }

    /// Splits along the longest axis of the node at the median of the primitive centres,
    /// falling back to the middle of the node when the median lies on its border.
    fn cut(objs: &[RenderWrapper], bounds: &AABB) -> AAPlane {
        let axis = bounds.max_extent();
        let (lo, hi) = (bounds.min.axis(axis), bounds.max.axis(axis));

        let mut centers = objs
            .iter()
            .map(|w| w.aabb.center().axis(axis))
            .collect::<Vec<_>>();
        let mid = centers.len() / 2;
        let (_, median, _) = centers.select_nth_unstable_by(mid, f64::total_cmp);
        let median = *median;

        let pos = if median > lo && median < hi {
            median
        } else {
            0.5 * (lo + hi)
        };

        AAPlane::new(axis, pos)
    }

    fn flatten(root: BuildNode, size: usize) -> Vec<FlatNode> {
        let mut tree = Vec::with_capacity(size);
        Self::flatten_impl(root, &mut tree);

        tree
    }

    fn flatten_impl(node: BuildNode, tree: &mut Vec<FlatNode>) -> usize {
        let offset = tree.len();
        match node.inner {
            BuildNodeInner::Interior { plane, left, right } => {
                tree.push(FlatNode::interior(node.bounds, plane, 0, 0));
                let left_idx = Self::flatten_impl(*left, tree);
                let right_idx = Self::flatten_impl(*right, tree);
                if let FlatNodeInner::Interior {
                    ref mut left,
                    ref mut right,
                    ..
                } = tree[offset].inner
                {
                    *left = left_idx;
                    *right = right_idx;
                }
            }
            BuildNodeInner::Leaf { objs } => {
                tree.push(FlatNode::leaf(node.bounds, objs.into_iter().collect()));
            }
        }

        offset
    }

    /// Bounds of every primitive in the tree
    pub fn get_aabb(&self) -> AABB {
        self.bounds
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Nearest hit strictly closer than `max_dist`, if any.
    ///
    /// `objs` must be the slice the tree was built from.
    pub fn get_trace<'a>(&self, objs: &'a [Primitive], ray: &'a Ray, max_dist: Option<f64>) -> Option<Trace<'a>> {
        let max_dist = max_dist.filter(|d| *d >= 0.0);
        let root = self.tree.first()?;
        let (t_near, mut t_far) = root.bounds.clip(ray)?;
        if let Some(max_dist) = max_dist {
            if t_near >= max_dist {
                return None;
            }
            t_far = t_far.min(max_dist);
        }

        let mut best = None;
        self.intersect(0, objs, ray, t_near, t_far, max_dist, &mut best);
        best
    }

    #[allow(clippy::too_many_arguments)]
    fn intersect<'a>(
        &self,
        node: usize,
        objs: &'a [Primitive],
        ray: &'a Ray,
        t_near: f64,
        t_far: f64,
        max_dist: Option<f64>,
        best: &mut Option<Trace<'a>>,
    ) {
        match &self.tree[node].inner {
            FlatNodeInner::Leaf { objs: wrapped } => {
                // Find the closest intersection
                for w in wrapped {
                    let limit = best.as_ref().map(Trace::intersection_dist).or(max_dist);
                    if let Some(trace) = objs[w.obj].get_trace(ray, limit) {
                        *best = Some(trace);
                    }
                }
            }
            &FlatNodeInner::Interior { plane, left, right } => {
                let (near, far, t_split) = Self::order(plane, left, right, ray);
                let Some(t_split) = t_split else {
                    self.intersect(near, objs, ray, t_near, t_far, max_dist, best);
                    return;
                };

                if t_split > t_far || t_split <= 0.0 {
                    self.intersect(near, objs, ray, t_near, t_far, max_dist, best);
                } else if t_split < t_near {
                    self.intersect(far, objs, ray, t_near, t_far, max_dist, best);
                } else {
                    self.intersect(near, objs, ray, t_near, t_split, max_dist, best);
                    // Everything in the far child lies beyond the split
                    if best.as_ref().is_some_and(|trace| trace.intersection_dist() <= t_split) {
                        return;
                    }
                    self.intersect(far, objs, ray, t_split, t_far, max_dist, best);
                }
            }
        }
    }

    /// Whether any primitive is hit strictly closer than `dist`.
    ///
    /// Walks the tree in the same order as [`KdTree::get_trace`] but returns on the first
    /// hit instead of looking for the nearest one.
    pub fn find_any(&self, objs: &[Primitive], ray: &Ray, dist: f64) -> bool {
        let Some(root) = self.tree.first() else {
            return false;
        };
        match root.bounds.clip(ray) {
            Some((t_near, t_far)) if t_near < dist => self.any_hit(0, objs, ray, t_near, t_far.min(dist), dist),
            _ => false,
        }
    }

    fn any_hit(&self, node: usize, objs: &[Primitive], ray: &Ray, t_near: f64, t_far: f64, dist: f64) -> bool {
        match &self.tree[node].inner {
            FlatNodeInner::Leaf { objs: wrapped } => wrapped
                .iter()
                .any(|w| objs[w.obj].get_trace(ray, Some(dist)).is_some()),
            &FlatNodeInner::Interior { plane, left, right } => {
                let (near, far, t_split) = Self::order(plane, left, right, ray);
                let Some(t_split) = t_split else {
                    return self.any_hit(near, objs, ray, t_near, t_far, dist);
                };

                if t_split > t_far || t_split <= 0.0 {
                    self.any_hit(near, objs, ray, t_near, t_far, dist)
                } else if t_split < t_near {
                    self.any_hit(far, objs, ray, t_near, t_far, dist)
                } else {
                    self.any_hit(near, objs, ray, t_near, t_split, dist)
                        || self.any_hit(far, objs, ray, t_split, t_far, dist)
                }
            }
        }
    }

    /// Children of an interior node as (near, far) seen from the ray origin, and the ray
    /// parameter where it crosses the split, `None` when it runs parallel to it.
    fn order(plane: AAPlane, left: usize, right: usize, ray: &Ray) -> (usize, usize, Option<f64>) {
        let orig = ray.orig.axis(plane.axis);
        let dir = ray.dir.axis(plane.axis);

        // The child on the origin's side is entered first
        let (near, far) = if orig < plane.pos || (orig == plane.pos && dir <= 0.0) {
            (left, right)
        } else {
            (right, left)
        };

        if dir == 0.0 {
            (near, far, None)
        } else {
            (near, far, Some((plane.pos - orig) / dir))
        }
    }
}

#[derive(Debug)]
enum BuildNodeInner {
    Interior {
        plane: AAPlane,
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
    Leaf {
        objs: Vec<RenderWrapper>,
    },
}

#[derive(Debug)]
struct BuildNode {
    bounds: AABB,
    inner: BuildNodeInner,
}

impl BuildNode {
    fn interior(bounds: AABB, plane: AAPlane, left: Box<BuildNode>, right: Box<BuildNode>) -> Self {
        Self {
            bounds,
            inner: BuildNodeInner::Interior { plane, left, right },
        }
    }

    fn leaf(bounds: AABB, objs: Vec<RenderWrapper>) -> Self {
        Self {
            bounds,
            inner: BuildNodeInner::Leaf { objs },
        }
    }
}

#[derive(Debug)]
enum FlatNodeInner {
    Interior {
        plane: AAPlane,
        left: usize,
        right: usize,
    },
    Leaf {
        objs: SmallVec<[RenderWrapper; 4]>,
    },
}

#[derive(Debug)]
struct FlatNode {
    bounds: AABB,
    inner: FlatNodeInner,
}

impl FlatNode {
    fn interior(bounds: AABB, plane: AAPlane, left: usize, right: usize) -> Self {
        Self {
            bounds,
            inner: FlatNodeInner::Interior { plane, left, right },
        }
    }

    fn leaf(bounds: AABB, objs: SmallVec<[RenderWrapper; 4]>) -> Self {
        Self {
            bounds,
            inner: FlatNodeInner::Leaf { objs },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{BasePlane, EPS},
        material::{Surface, WHITE},
        primitives::{Plane, Sphere, Triangle},
        textures::{Texture, UniformTexture},
    };
    use glam::DVec3;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256Plus;
    use std::sync::Arc;

    fn texture() -> Arc<dyn Texture> {
        Arc::new(UniformTexture::new(Surface::matte(WHITE)))
    }

    fn random_point(rng: &mut Xoshiro256Plus, extent: f64) -> DVec3 {
        DVec3::new(
            rng.gen_range(-extent..extent),
            rng.gen_range(-extent..extent),
            rng.gen_range(-extent..extent),
        )
    }

    fn random_scene(rng: &mut Xoshiro256Plus, count: usize) -> Vec<Primitive> {
        (0..count)
            .map(|i| -> Primitive {
                match i % 3 {
                    0 => Sphere::new(random_point(rng, 10.0), rng.gen_range(0.2..1.5), texture()).into(),
                    1 => {
                        let a = random_point(rng, 10.0);
                        Triangle::new(a, a + random_point(rng, 2.0), a + random_point(rng, 2.0), texture()).into()
                    }
                    _ => Plane::disk(random_point(rng, 10.0), random_point(rng, 1.0) + DVec3::splat(0.01), rng.gen_range(0.5..2.0), texture()).into(),
                }
            })
            .collect()
    }

    fn brute_force<'a>(objs: &'a [Primitive], ray: &'a Ray) -> Option<Trace<'a>> {
        let mut best: Option<Trace<'a>> = None;
        for obj in objs {
            let limit = best.as_ref().map(Trace::intersection_dist);
            if let Some(trace) = obj.get_trace(ray, limit) {
                best = Some(trace);
            }
        }
        best
    }

    fn config(leaf_size: usize) -> KdTreeConfig {
        KdTreeConfig {
            leaf_size,
            ..KdTreeConfig::default()
        }
    }

    #[test]
    fn agrees_with_brute_force() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let objs = random_scene(&mut rng, 120);
        let handles = (0..objs.len()).collect::<Vec<_>>();
        let tree = KdTree::new(&objs, &handles, &AABB::empty(), &config(2));
        assert!(tree.node_count() > 1);

        let mut hits = 0;
        for _ in 0..3000 {
            let orig = random_point(&mut rng, 14.0);
            let dir = (random_point(&mut rng, 10.0) - orig).normalize();
            let ray = Ray::new(orig, dir);

            let expected = brute_force(&objs, &ray);
            let got = tree.get_trace(&objs, &ray, None);
            match (expected, got) {
                (None, None) => {}
                (Some(expected), Some(got)) => {
                    hits += 1;
                    assert!((expected.intersection_dist() - got.intersection_dist()).abs() < EPS);
                    assert!(expected.same_primitive(&got));
                }
                (expected, got) => panic!(
                    "tree and brute force disagree: {:?} vs {:?}",
                    expected.map(|t| t.intersection_dist()),
                    got.map(|t| t.intersection_dist())
                ),
            }
        }
        assert!(hits > 300);
    }

    #[test]
    fn respects_max_dist() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let objs = random_scene(&mut rng, 60);
        let handles = (0..objs.len()).collect::<Vec<_>>();
        let tree = KdTree::new(&objs, &handles, &AABB::empty(), &config(1));

        for _ in 0..1000 {
            let orig = random_point(&mut rng, 14.0);
            let ray = Ray::new(orig, (random_point(&mut rng, 10.0) - orig).normalize());
            let max_dist = rng.gen_range(0.5..20.0);

            let expected = brute_force(&objs, &ray).filter(|t| t.intersection_dist() < max_dist);
            let got = tree.get_trace(&objs, &ray, Some(max_dist));
            assert_eq!(expected.is_some(), got.is_some());
            if let Some(got) = got {
                assert!(got.intersection_dist() < max_dist);
            }
        }
    }

    #[test]
    fn find_any_agrees_with_brute_force() {
        let mut rng = Xoshiro256Plus::seed_from_u64(17);
        let objs = random_scene(&mut rng, 90);
        let handles = (0..objs.len()).collect::<Vec<_>>();
        let tree = KdTree::new(&objs, &handles, &AABB::empty(), &config(2));

        let mut blocked = 0;
        for _ in 0..2000 {
            let orig = random_point(&mut rng, 14.0);
            let ray = Ray::new(orig, (random_point(&mut rng, 10.0) - orig).normalize());
            let dist = rng.gen_range(0.5..25.0);

            let expected = objs.iter().any(|obj| obj.get_trace(&ray, Some(dist)).is_some());
            assert_eq!(tree.find_any(&objs, &ray, dist), expected);
            if expected {
                blocked += 1;
            }
        }
        assert!(blocked > 100);
    }

    #[test]
    fn negative_max_dist_is_unbounded() {
        let mut rng = Xoshiro256Plus::seed_from_u64(8);
        let objs = random_scene(&mut rng, 30);
        let handles = (0..objs.len()).collect::<Vec<_>>();
        let tree = KdTree::new(&objs, &handles, &AABB::empty(), &config(2));

        for _ in 0..300 {
            let orig = random_point(&mut rng, 14.0);
            let ray = Ray::new(orig, (random_point(&mut rng, 10.0) - orig).normalize());
            let unbounded = tree.get_trace(&objs, &ray, None).map(|t| t.intersection_dist());
            let negative = tree.get_trace(&objs, &ray, Some(-1.0)).map(|t| t.intersection_dist());
            assert_eq!(unbounded, negative);
        }
    }

    #[test]
    fn axis_aligned_rays_along_split_planes() {
        // A grid of spheres produces splits exactly between their centres
        let objs = (0..4)
            .flat_map(|x| (0..4).map(move |y| (x, y)))
            .map(|(x, y)| -> Primitive { Sphere::new(DVec3::new(x as f64 * 2.0, y as f64 * 2.0, 0.0), 0.9, texture()).into() })
            .collect::<Vec<Primitive>>();
        let handles = (0..objs.len()).collect::<Vec<_>>();
        let tree = KdTree::new(&objs, &handles, &AABB::empty(), &config(1));

        for x in [0.0, 1.0, 2.0, 3.0, 4.0] {
            for dir in [DVec3::Y, -DVec3::Y] {
                let orig = DVec3::new(x, if dir.y > 0.0 { -5.0 } else { 12.0 }, 0.0);
                let ray = Ray::new(orig, dir);
                let expected = brute_force(&objs, &ray).map(|t| t.intersection_dist());
                let got = tree.get_trace(&objs, &ray, None).map(|t| t.intersection_dist());
                assert_eq!(expected.is_some(), got.is_some());
                if let (Some(e), Some(g)) = (expected, got) {
                    assert!((e - g).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn bounds_cover_all_primitives() {
        let objs: Vec<Primitive> = vec![
            Sphere::new(DVec3::new(-3.0, 0.0, 0.0), 1.0, texture()).into(),
            Sphere::new(DVec3::new(4.0, 2.0, 1.0), 0.5, texture()).into(),
        ];
        let tree = KdTree::new(&objs, &[0, 1], &AABB::empty(), &config(1));
        let aabb = tree.get_aabb();
        assert_eq!(aabb.min, DVec3::new(-4.0, -1.0, -1.0));
        assert_eq!(aabb.max, DVec3::new(4.5, 2.5, 1.5));
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn empty_tree_never_hits() {
        let tree = KdTree::new(&[], &[], &AABB::empty(), &config(4));
        let ray = Ray::new(DVec3::ZERO, DVec3::X);
        assert!(tree.get_trace(&[], &ray, None).is_none());
    }

    #[test]
    #[should_panic(expected = "no bounding box")]
    fn unbounded_primitives_are_rejected() {
        let objs: Vec<Primitive> = vec![Plane::infinite(BasePlane::new(DVec3::ZERO, DVec3::Z), texture()).into()];
        KdTree::new(&objs, &[0], &AABB::empty(), &config(4));
    }
}
