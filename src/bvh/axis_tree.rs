//! The axis-split hierarchy: every node orders its range around the median along the
//! axis of largest center spread. Nodes can be sorted eagerly or on first use.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use log::debug;

use crate::bounding_hierarchy::{BHValue, Hierarchy, ItemIdx, NodeId, NodeView, PrimitiveId};
use crate::bvh::{Divider, Node};
use crate::error::{BvhError, Result};

/// Subtrees with more items than this are sorted in parallel by [`AxisTree::sort`].
#[cfg(feature = "rayon")]
const PARALLEL_SORT_THRESHOLD: usize = 64;

/// A hierarchy split at the median of the most spread axis.
///
/// The node layout is fixed by [`AxisTree::allocate`]; sorting a node computes its
/// volume and partitions its item range. A node may only be sorted after its parent.
/// Sorting is serialized per node: concurrent requests for the same node block until
/// one of them has finished, so the tree can be materialized lazily from several
/// threads at once.
#[derive(Debug)]
pub struct AxisTree<T: BHValue, const D: usize, Div: Divider<T, D>> {
    divider: Div,
    nodes: Vec<Node>,
    volumes: Vec<OnceLock<Div::Volume>>,
    // Written only while sorting the node that owns the slot's range; published to
    // readers through that node's volume cell.
    items: Vec<AtomicUsize>,
    min_leaf_size: usize,
    marker: PhantomData<T>,
}

impl<T: BHValue, const D: usize, Div: Divider<T, D>> AxisTree<T, D, Div> {
    /// Creates an empty tree that partitions with `divider`.
    pub fn new(divider: Div) -> Self {
        AxisTree {
            divider,
            nodes: Vec::new(),
            volumes: Vec::new(),
            items: Vec::new(),
            min_leaf_size: 1,
            marker: PhantomData,
        }
    }

    /// Lays out the tree for `count` primitives with leaves of at most `min_leaf_size`
    /// items. No node is sorted afterwards.
    pub fn allocate(&mut self, count: usize, min_leaf_size: usize) -> Result<()> {
        if min_leaf_size == 0 {
            return Err(BvhError::invalid_configuration(
                "minimum leaf size must be positive",
            ));
        }
        let available = self.divider.primitive_count();
        if count != available {
            return Err(BvhError::invalid_configuration(format!(
                "allocating {count} items over {available} primitives"
            )));
        }
        let nodes = Node::layout(count, min_leaf_size, |first, last| first + (last - first) / 2);
        self.volumes = nodes.iter().map(|_| OnceLock::new()).collect();
        self.items = (0..count).map(AtomicUsize::new).collect();
        self.nodes = nodes;
        self.min_leaf_size = min_leaf_size;
        Ok(())
    }

    /// Allocates a tree over every primitive of `divider` and sorts it completely.
    pub fn build(divider: Div, min_leaf_size: usize) -> Result<Self> {
        let mut tree = Self::lazy(divider, min_leaf_size)?;
        tree.sort();
        Ok(tree)
    }

    /// Allocates a tree over every primitive of `divider` without sorting any node.
    pub fn lazy(divider: Div, min_leaf_size: usize) -> Result<Self> {
        let count = divider.primitive_count();
        let mut tree = Self::new(divider);
        tree.allocate(count, min_leaf_size)?;
        Ok(tree)
    }

    /// Sorts node `id`. Sorting an already sorted node does nothing.
    ///
    /// Fails with [`BvhError::UnsortedNodeAccessed`] if the parent of `id` has not been
    /// sorted yet.
    pub fn sort_node(&self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(BvhError::IndexOutOfRange {
            index: id,
            len: self.nodes.len(),
        })?;
        if let Some(parent) = node.parent {
            if !self.is_sorted(parent) {
                return Err(BvhError::UnsortedNodeAccessed { node: id });
            }
        }
        self.materialize(id);
        Ok(())
    }

    /// Sorts every node of the tree.
    pub fn sort(&self) {
        if let Some(root) = self.root() {
            self.sort_subtree(root);
            debug!(
                "sorted axis-split hierarchy over {} primitives: {} nodes, leaf size {}",
                self.items.len(),
                self.nodes.len(),
                self.min_leaf_size
            );
        }
    }

    /// Returns true if node `id` has been sorted.
    pub fn is_sorted(&self, id: NodeId) -> bool {
        self.volumes.get(id).is_some_and(|cell| cell.get().is_some())
    }

    /// The number of nodes sorted so far.
    pub fn sorted_count(&self) -> usize {
        self.volumes.iter().filter(|cell| cell.get().is_some()).count()
    }

    /// The structural nodes, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The largest number of items a leaf may hold.
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }

    /// The divider used to sort nodes.
    pub fn divider(&self) -> &Div {
        &self.divider
    }

    fn sort_subtree(&self, id: NodeId) {
        self.materialize(id);
        let node = self.nodes[id];
        if let Some((left, right)) = node.children() {
            #[cfg(feature = "rayon")]
            {
                if node.len() > PARALLEL_SORT_THRESHOLD {
                    rayon::join(|| self.sort_subtree(left), || self.sort_subtree(right));
                    return;
                }
            }
            self.sort_subtree(left);
            self.sort_subtree(right);
        }
    }

    /// Returns the volume of `id`, sorting the node and its unsorted ancestors first.
    fn materialize(&self, id: NodeId) -> &Div::Volume {
        if let Some(volume) = self.volumes[id].get() {
            return volume;
        }
        if let Some(parent) = self.nodes[id].parent {
            self.materialize(parent);
        }
        self.volumes[id].get_or_init(|| self.divide(id))
    }

    /// Computes the volume of `id` and, for internal nodes, moves the lower half of its
    /// items along the split axis into the left child's range.
    fn divide(&self, id: NodeId) -> Div::Volume {
        let node = self.nodes[id];
        let mut ids: Vec<PrimitiveId> = self.items[node.range()]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect();
        let division = self.divider.divide(&ids);
        if let Some(left) = node.left_child {
            let mid = self.nodes[left].len();
            ids.select_nth_unstable_by(mid, |&a, &b| self.divider.compare(division.axis, a, b));
            for (slot, primitive) in self.items[node.range()].iter().zip(ids) {
                slot.store(primitive, Ordering::Relaxed);
            }
        }
        division.volume
    }
}

impl<T: BHValue, const D: usize, Div: Divider<T, D>> Hierarchy<T, D> for AxisTree<T, D, Div> {
    type Volume = Div::Volume;

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

    fn node(&self, id: NodeId) -> NodeView<'_, Div::Volume> {
        let volume = self.materialize(id);
        let node = &self.nodes[id];
        NodeView {
            id,
            children: node.children(),
            first: node.first,
            last: node.last,
            volume,
        }
    }

    fn item(&self, slot: ItemIdx) -> PrimitiveId {
        self.items[slot].load(Ordering::Relaxed)
    }

    fn materialize_all(&self) {
        self.sort();
    }
}
