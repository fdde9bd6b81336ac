//! This module defines the [`Hierarchy`] trait, the query contract shared by all trees
//! in this crate, together with the scalar bound [`BHValue`].

use core::fmt::{Debug, Display};
use core::ops::Range;

use nalgebra::{ClosedAddAssign, ClosedMulAssign, ClosedSubAssign, Scalar, SimdPartialOrd};
use num_traits::{Float, FromPrimitive, ToPrimitive};

use crate::bounding_volume::BoundingVolume;
use crate::error::{BvhError, Result};

/// Index of a node inside a tree's node arena.
pub type NodeId = usize;

/// Index into a tree's item permutation.
pub type ItemIdx = usize;

/// Index of a primitive in the caller-owned primitive storage.
pub type PrimitiveId = usize;

/// Encapsulates the required traits for the value type used in the hierarchies.
pub trait BHValue:
    Scalar
    + Copy
    + FromPrimitive
    + ToPrimitive
    + Float
    + ClosedSubAssign
    + ClosedAddAssign
    + ClosedMulAssign
    + SimdPartialOrd
    + Display
    + Send
    + Sync
{
}

impl<T> BHValue for T where
    T: Scalar
        + Copy
        + FromPrimitive
        + ToPrimitive
        + Float
        + ClosedSubAssign
        + ClosedAddAssign
        + ClosedMulAssign
        + SimdPartialOrd
        + Display
        + Send
        + Sync
{
}

/// A read-only view of a materialized node.
///
/// Views are the only way queries observe nodes. Trees that build nodes lazily
/// materialize a node before handing out its view, so a view never describes an
/// unsorted node.
#[derive(Debug)]
pub struct NodeView<'a, V> {
    /// The id of the viewed node.
    pub id: NodeId,
    /// The node's children, `None` for leaves. The right child always follows the left one.
    pub children: Option<(NodeId, NodeId)>,
    /// First item slot of the node's range.
    pub first: ItemIdx,
    /// One past the last item slot of the node's range.
    pub last: ItemIdx,
    /// The volume enclosing every primitive in the node's range.
    pub volume: &'a V,
}

impl<V> Clone for NodeView<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeView<'_, V> {}

impl<V> NodeView<'_, V> {
    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The item slots covered by this node.
    pub fn range(&self) -> Range<ItemIdx> {
        self.first..self.last
    }

    /// The number of items covered by this node.
    pub fn len(&self) -> usize {
        self.last - self.first
    }

    /// Returns true if the node covers no items.
    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }
}

/// The query contract shared by every tree in this crate. A hierarchy is an
/// index-addressed binary tree over a permutation of primitive indices.
pub trait Hierarchy<T: BHValue, const D: usize>: Sync {
    /// The bounding volume stored per node.
    type Volume: BoundingVolume<T, D>;

    /// The number of primitives the hierarchy was built over.
    fn primitive_count(&self) -> usize;

    /// The number of nodes in the hierarchy.
    fn node_count(&self) -> usize;

    /// The root node, or `None` for a hierarchy without primitives.
    fn root(&self) -> Option<NodeId>;

    /// Returns a view of node `id`, materializing it first if necessary.
    ///
    /// # Panics
    /// Panics if `id` is not smaller than [`Hierarchy::node_count`].
    fn node(&self, id: NodeId) -> NodeView<'_, Self::Volume>;

    /// Returns the primitive stored at item slot `slot`.
    ///
    /// Slots of a node are only meaningful once the node has been viewed.
    ///
    /// # Panics
    /// Panics if `slot` is not smaller than [`Hierarchy::primitive_count`].
    fn item(&self, slot: ItemIdx) -> PrimitiveId;

    /// Materializes every node up front. A no-op for eagerly built hierarchies.
    fn materialize_all(&self) {}

    /// Returns true if the hierarchy holds no primitives.
    fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }

    /// Checked version of [`Hierarchy::node`].
    fn try_node(&self, id: NodeId) -> Result<NodeView<'_, Self::Volume>> {
        let len = self.node_count();
        if id < len {
            Ok(self.node(id))
        } else {
            Err(BvhError::IndexOutOfRange { index: id, len })
        }
    }

    /// Checked version of [`Hierarchy::item`].
    fn try_item(&self, slot: ItemIdx) -> Result<PrimitiveId> {
        let len = self.primitive_count();
        if slot < len {
            Ok(self.item(slot))
        } else {
            Err(BvhError::IndexOutOfRange { index: slot, len })
        }
    }
}

/// Verifies the structural invariants of a hierarchy:
/// the items form a permutation of the primitives, every internal node's range is the
/// exact concatenation of its children's ranges, children are index-paired and point
/// back to their parent, and every node is reachable from the root.
///
/// Materializes every node of lazily built hierarchies.
pub fn validate<T: BHValue, const D: usize, H: Hierarchy<T, D>>(tree: &H) -> Result<()> {
    let n = tree.primitive_count();
    let Some(root) = tree.root() else {
        if tree.node_count() != 0 || n != 0 {
            return Err(BvhError::CorruptHierarchy {
                node: 0,
                reason: "nodes present without a root",
            });
        }
        return Ok(());
    };

    let view = tree.try_node(root)?;
    if view.first != 0 || view.last != n {
        return Err(BvhError::CorruptHierarchy {
            node: root,
            reason: "root does not span every item",
        });
    }

    let mut seen_nodes = vec![false; tree.node_count()];
    let mut stack = vec![(root, None)];
    let mut covered = 0;
    while let Some((id, expected_parent)) = stack.pop() {
        if core::mem::replace(&mut seen_nodes[id], true) {
            return Err(BvhError::CorruptHierarchy {
                node: id,
                reason: "node reached twice",
            });
        }
        let view = tree.try_node(id)?;
        if view.is_empty() {
            return Err(BvhError::CorruptHierarchy {
                node: id,
                reason: "node with an empty range",
            });
        }
        match view.children {
            Some((left, right)) => {
                if right != left + 1 {
                    return Err(BvhError::CorruptHierarchy {
                        node: id,
                        reason: "children are not index-paired",
                    });
                }
                let l = tree.try_node(left)?;
                let r = tree.try_node(right)?;
                if l.first != view.first || l.last != r.first || r.last != view.last {
                    return Err(BvhError::CorruptHierarchy {
                        node: id,
                        reason: "children do not partition the parent range",
                    });
                }
                stack.push((right, Some(id)));
                stack.push((left, Some(id)));
            }
            None => covered += view.len(),
        }
        if let Some(parent) = expected_parent {
            let parent_view = tree.try_node(parent)?;
            if parent_view.children.map_or(true, |(l, r)| l != id && r != id) {
                return Err(BvhError::CorruptHierarchy {
                    node: id,
                    reason: "parent does not list node as a child",
                });
            }
        }
    }

    if covered != n {
        return Err(BvhError::CorruptHierarchy {
            node: root,
            reason: "leaf ranges do not cover every item",
        });
    }
    if let Some(detached) = seen_nodes.iter().position(|seen| !seen) {
        return Err(BvhError::CorruptHierarchy {
            node: detached,
            reason: "node is not reachable from the root",
        });
    }

    let mut seen_primitives = vec![false; n];
    for slot in 0..n {
        let primitive = tree.item(slot);
        if primitive >= n {
            return Err(BvhError::IndexOutOfRange {
                index: primitive,
                len: n,
            });
        }
        if core::mem::replace(&mut seen_primitives[primitive], true) {
            return Err(BvhError::CorruptHierarchy {
                node: root,
                reason: "primitive listed twice",
            });
        }
    }
    Ok(())
}

/// Returns the depth of the deepest leaf. The root has depth `0`; an empty
/// hierarchy reports `0` as well.
pub fn depth<T: BHValue, const D: usize, H: Hierarchy<T, D>>(tree: &H) -> usize {
    let mut max_depth = 0;
    let mut stack: Vec<(NodeId, usize)> = tree.root().map(|root| (root, 0)).into_iter().collect();
    while let Some((id, depth)) = stack.pop() {
        max_depth = max_depth.max(depth);
        if let Some((left, right)) = tree.node(id).children {
            stack.push((left, depth + 1));
            stack.push((right, depth + 1));
        }
    }
    max_depth
}

/// Returns the number of leaves reachable from the root.
pub fn leaf_count<T: BHValue, const D: usize, H: Hierarchy<T, D>>(tree: &H) -> usize {
    let mut leaves = 0;
    let mut stack: Vec<NodeId> = tree.root().into_iter().collect();
    while let Some(id) = stack.pop() {
        match tree.node(id).children {
            Some((left, right)) => {
                stack.push(left);
                stack.push(right);
            }
            None => leaves += 1,
        }
    }
    leaves
}
