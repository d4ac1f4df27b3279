//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over indices into the scene's primitive buffer. Built by a
//! median split on the longest centroid axis.

use std::time::Instant;

use tern_math::{Aabb, Interval, Ray};

use crate::{Accelerator, Intersection, Primitive};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node holding a few primitive indices.
    Leaf { indices: Vec<usize>, bbox: Aabb },
    /// Empty tree.
    Empty,
}

/// Per-primitive data needed while building.
struct BuildItem {
    index: usize,
    bbox: Aabb,
    centroid: tern_math::Vec3,
}

impl BvhNode {
    fn build(mut items: Vec<BuildItem>, node_count: &mut usize) -> Self {
        *node_count += 1;
        let n = items.len();

        let bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, item| Aabb::surrounding(&acc, &item.bbox));

        // Create leaf for small sets
        if n <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                indices: items.iter().map(|item| item.index).collect(),
                bbox: bounds,
            };
        }

        // Choose split axis based on centroid spread
        let centroids: Vec<_> = items.iter().map(|item| item.centroid).collect();
        let axis = Aabb::from_point_cloud(&centroids).longest_axis();

        items.sort_unstable_by(|a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Split at midpoint
        let right_items = items.split_off(n / 2);
        let left = Self::build(items, node_count);
        let right = Self::build(right_items, node_count);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox: bounds,
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn hit(&self, primitives: &[Primitive], ray: &Ray, ray_t: Interval, rec: &mut Intersection) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { indices, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let mut hit_anything = false;
                let mut closest = ray_t.max;

                for &index in indices {
                    if primitives[index].intersect(ray, ray_t.with_max(closest), rec) {
                        hit_anything = true;
                        closest = rec.t;
                        rec.primitive = Some(index);
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(primitives, ray, ray_t, rec);

                // Only check right up to closest hit
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(primitives, ray, ray_t.with_max(right_max), rec);

                hit_left || hit_right
            }
        }
    }

    fn hit_any(&self, primitives: &[Primitive], ray: &Ray, ray_t: Interval) -> bool {
        match self {
            BvhNode::Empty => false,
            BvhNode::Leaf { indices, bbox } => {
                bbox.hit(ray, ray_t)
                    && indices
                        .iter()
                        .any(|&index| primitives[index].intersect_p(ray, ray_t))
            }
            BvhNode::Branch { left, right, bbox } => {
                bbox.hit(ray, ray_t)
                    && (left.hit_any(primitives, ray, ray_t) || right.hit_any(primitives, ray, ray_t))
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
            _ => 1,
        }
    }
}

/// BVH accelerator. Empty until [`Accelerator::build`] is called.
#[derive(Debug)]
pub struct Bvh {
    root: BvhNode,
    primitive_count: usize,
    node_count: usize,
}

impl Bvh {
    pub fn new() -> Self {
        Self {
            root: BvhNode::Empty,
            primitive_count: 0,
            node_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn depth(&self) -> usize {
        match self.root {
            BvhNode::Empty => 0,
            _ => self.root.depth(),
        }
    }
}

impl Default for Bvh {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerator for Bvh {
    fn name(&self) -> &'static str {
        "bvh"
    }

    fn build(&mut self, primitives: &[Primitive]) {
        let start = Instant::now();
        let items: Vec<BuildItem> = primitives
            .iter()
            .enumerate()
            .map(|(index, prim)| BuildItem {
                index,
                bbox: prim.bounding_box(),
                centroid: prim.bounding_box().centroid(),
            })
            .collect();

        let mut node_count = 0;
        self.root = if items.is_empty() {
            BvhNode::Empty
        } else {
            BvhNode::build(items, &mut node_count)
        };
        self.primitive_count = primitives.len();
        self.node_count = node_count;

        log::debug!(
            "Built BVH over {} primitives: {} nodes, depth {}, in {:?}",
            self.primitive_count,
            self.node_count,
            self.depth(),
            start.elapsed()
        );
    }

    fn intersect(&self, primitives: &[Primitive], ray: &Ray, rec: &mut Intersection) -> bool {
        debug_assert_eq!(primitives.len(), self.primitive_count, "BVH queried with a different primitive buffer");
        self.root.hit(primitives, ray, ray.interval(), rec)
    }

    fn intersect_p(&self, primitives: &[Primitive], ray: &Ray) -> bool {
        debug_assert_eq!(primitives.len(), self.primitive_count, "BVH queried with a different primitive buffer");
        self.root.hit_any(primitives, ray, ray.interval())
    }

    fn bounding_box(&self) -> Aabb {
        self.root.bounding_box()
    }
}
