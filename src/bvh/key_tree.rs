//! The key-ordered hierarchy: primitives are sorted by a scalar key (typically a Morton
//! code) and ranges are split where the longest common key prefix ends.

use core::marker::PhantomData;

use log::debug;
use num_traits::PrimInt;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{BHValue, Hierarchy, ItemIdx, NodeId, NodeView, PrimitiveId};
use crate::bounding_volume::BoundingVolume;
use crate::bvh::{BoxFunctor, KeyFunctor, Node, ShapeBoxes};
use crate::error::{BvhError, Result};
use crate::morton::MortonKeys;

/// A hierarchy built by sorting primitives along a key and splitting ranges at the
/// highest differing key bit. Built eagerly; read-only afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyTree<T: BHValue, const D: usize, V> {
    nodes: Vec<Node>,
    volumes: Vec<V>,
    items: Vec<PrimitiveId>,
    min_leaf_size: usize,
    allocated: bool,
    marker: PhantomData<T>,
}

impl<T: BHValue, const D: usize, V: BoundingVolume<T, D>> Default for KeyTree<T, D, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: BHValue, const D: usize, V: BoundingVolume<T, D>> KeyTree<T, D, V> {
    /// Creates an empty, unallocated tree.
    pub fn new() -> Self {
        KeyTree {
            nodes: Vec::new(),
            volumes: Vec::new(),
            items: Vec::new(),
            min_leaf_size: 1,
            allocated: false,
            marker: PhantomData,
        }
    }

    /// Reserves storage for `count` primitives with leaves of at most `min_leaf_size`
    /// items. Discards any previous build.
    pub fn allocate(&mut self, count: usize, min_leaf_size: usize) -> Result<()> {
        if min_leaf_size == 0 {
            return Err(BvhError::invalid_configuration(
                "minimum leaf size must be positive",
            ));
        }
        self.nodes.clear();
        self.volumes.clear();
        self.nodes.reserve(2 * count.div_ceil(min_leaf_size));
        self.items = (0..count).collect();
        self.min_leaf_size = min_leaf_size;
        self.allocated = true;
        Ok(())
    }

    /// Builds the tree over the allocated primitives.
    ///
    /// Keys are stably sorted, so primitives sharing a key keep their index order.
    /// Either the whole tree is built or, on error, the tree is left untouched.
    pub fn build<K, B>(&mut self, keys: &K, boxes: &B) -> Result<()>
    where
        K: KeyFunctor,
        B: BoxFunctor<T, D, Volume = V>,
    {
        if !self.allocated {
            return Err(BvhError::invalid_configuration(
                "build called before allocate",
            ));
        }
        let count = self.items.len();

        #[cfg(feature = "rayon")]
        let mut keyed: Vec<(K::Key, PrimitiveId)> = (0..count)
            .into_par_iter()
            .map(|primitive| (keys.key(primitive), primitive))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let mut keyed: Vec<(K::Key, PrimitiveId)> = (0..count)
            .map(|primitive| (keys.key(primitive), primitive))
            .collect();

        #[cfg(feature = "rayon")]
        keyed.par_sort_by_key(|&(key, _)| key);
        #[cfg(not(feature = "rayon"))]
        keyed.sort_by_key(|&(key, _)| key);

        let (sorted_keys, items): (Vec<K::Key>, Vec<PrimitiveId>) = keyed.into_iter().unzip();
        let nodes = Node::layout(count, self.min_leaf_size, |first, last| {
            find_split(&sorted_keys, first, last)
        });

        #[cfg(feature = "rayon")]
        let volumes: Vec<V> = nodes
            .par_iter()
            .map(|node| boxes.bound(&items[node.range()]))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let volumes: Vec<V> = nodes
            .iter()
            .map(|node| boxes.bound(&items[node.range()]))
            .collect();

        debug!(
            "built key-ordered hierarchy over {} primitives: {} nodes, leaf size {}",
            count,
            nodes.len(),
            self.min_leaf_size
        );
        self.nodes = nodes;
        self.volumes = volumes;
        self.items = items;
        Ok(())
    }

    /// Allocates and builds a tree over `count` primitives in one step.
    pub fn with_functors<K, B>(
        count: usize,
        min_leaf_size: usize,
        keys: &K,
        boxes: &B,
    ) -> Result<Self>
    where
        K: KeyFunctor,
        B: BoxFunctor<T, D, Volume = V>,
    {
        let mut tree = Self::new();
        tree.allocate(count, min_leaf_size)?;
        tree.build(keys, boxes)?;
        Ok(tree)
    }

    /// The structural nodes, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The item permutation: slot to primitive.
    pub fn items(&self) -> &[PrimitiveId] {
        &self.items
    }

    /// The largest number of items a leaf may hold.
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }
}

impl<T: BHValue, const D: usize> KeyTree<T, D, Aabb<T, D>> {
    /// Builds a tree over `shapes` keyed by the Morton codes of their box centers.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use pairwise_bvh::bounding_hierarchy::Hierarchy;
    /// use pairwise_bvh::bvh::KeyTree;
    /// use nalgebra::Point3;
    ///
    /// let boxes: Vec<Aabb<f32, 3>> = (0..100)
    ///     .map(|i| {
    ///         let p = Point3::new(i as f32, 0.0, 0.0);
    ///         Aabb::with_bounds(p, p + nalgebra::Vector3::new(0.5, 0.5, 0.5))
    ///     })
    ///     .collect();
    /// let tree = KeyTree::from_shapes(&boxes, 4).unwrap();
    /// assert_eq!(tree.primitive_count(), 100);
    /// ```
    pub fn from_shapes<S: Bounded<T, D> + Sync>(shapes: &[S], min_leaf_size: usize) -> Result<Self> {
        let keys = MortonKeys::new(shapes);
        let boxes = ShapeBoxes::new(shapes);
        Self::with_functors(shapes.len(), min_leaf_size, &keys, &boxes)
    }
}

impl<T: BHValue, const D: usize, V: BoundingVolume<T, D>> Hierarchy<T, D> for KeyTree<T, D, V> {
    type Volume = V;

    fn primitive_count(&self) -> usize {
        self.items.len()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn node(&self, id: NodeId) -> NodeView<'_, V> {
        let node = &self.nodes[id];
        NodeView {
            id,
            children: node.children(),
            first: node.first,
            last: node.last,
            volume: &self.volumes[id],
        }
    }

    fn item(&self, slot: ItemIdx) -> PrimitiveId {
        self.items[slot]
    }
}

/// Finds the split position of the sorted key range `first..last`: the first slot whose
/// key no longer shares the range's longest common prefix with `keys[first]`.
/// Ranges of identical keys are split in the middle. The result always lies strictly
/// inside the range.
pub(crate) fn find_split<K: PrimInt>(keys: &[K], first: ItemIdx, last: ItemIdx) -> ItemIdx {
    debug_assert!(last - first >= 2);
    let first_key = keys[first];
    let last_key = keys[last - 1];
    if first_key == last_key {
        return first + (last - first) / 2;
    }

    let common_prefix = (first_key ^ last_key).leading_zeros();

    // Halving search for the highest slot still sharing more than the common prefix.
    let mut split = first;
    let mut step = last - 1 - first;
    loop {
        step = (step + 1) >> 1;
        let candidate = split + step;
        if candidate < last - 1 {
            let prefix = (first_key ^ keys[candidate]).leading_zeros();
            if prefix > common_prefix {
                split = candidate;
            }
        }
        if step <= 1 {
            break;
        }
    }
    split + 1
}
