use core::ops::Range;

use crate::bounding_hierarchy::{ItemIdx, NodeId};

/// The structural part of a node: its place in the tree and the item slots it covers.
///
/// Bounding volumes are stored next to the nodes by the trees themselves. Children
/// are always allocated in pairs, so the right child of a node is `left_child + 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// The node's parent, `None` for the root.
    pub parent: Option<NodeId>,

    /// The node's left child, `None` for leaves.
    pub left_child: Option<NodeId>,

    /// First item slot of the node's range.
    pub first: ItemIdx,

    /// One past the last item slot of the node's range.
    pub last: ItemIdx,
}

impl Node {
    /// Creates a leaf over `first..last`.
    pub fn new(parent: Option<NodeId>, first: ItemIdx, last: ItemIdx) -> Node {
        Node {
            parent,
            left_child: None,
            first,
            last,
        }
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left_child.is_none()
    }

    /// Returns the index of the right child node.
    pub fn right_child(&self) -> Option<NodeId> {
        self.left_child.map(|left| left + 1)
    }

    /// Returns both children, `None` for leaves.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.left_child.map(|left| (left, left + 1))
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

    /// Lays out a tree over `count` items breadth-first, splitting every node whose
    /// range exceeds `min_leaf_size` at the position `split(first, last)` returns.
    ///
    /// `split` must return a position strictly inside the range.
    pub(crate) fn layout(
        count: usize,
        min_leaf_size: usize,
        mut split: impl FnMut(ItemIdx, ItemIdx) -> ItemIdx,
    ) -> Vec<Node> {
        if count == 0 {
            return Vec::new();
        }
        let mut nodes = Vec::with_capacity(2 * count.div_ceil(min_leaf_size));
        nodes.push(Node::new(None, 0, count));

        // Nodes are appended in pairs behind the cursor, so the arena itself is the queue.
        let mut cursor = 0;
        while cursor < nodes.len() {
            let Node { first, last, .. } = nodes[cursor];
            if last - first > min_leaf_size {
                let mid = split(first, last);
                debug_assert!(first < mid && mid < last, "split {mid} outside {first}..{last}");
                let left = nodes.len();
                nodes.push(Node::new(Some(cursor), first, mid));
                nodes.push(Node::new(Some(cursor), mid, last));
                nodes[cursor].left_child = Some(left);
            }
            cursor += 1;
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::Node;

    #[test]
    fn test_layout_median() {
        let nodes = Node::layout(10, 2, |first, last| first + (last - first) / 2);
        assert_eq!(nodes[0].range(), 0..10);
        assert_eq!(nodes[0].children(), Some((1, 2)));
        assert_eq!(nodes[1].range(), 0..5);
        assert_eq!(nodes[2].range(), 5..10);
        assert_eq!(nodes[1].parent, Some(0));

        let leaves: usize = nodes.iter().filter(|n| n.is_leaf()).map(Node::len).sum();
        assert_eq!(leaves, 10);
        assert!(nodes.iter().filter(|n| n.is_leaf()).all(|n| n.len() <= 2));
        assert!(nodes.iter().all(|n| !n.is_empty()));
    }

    #[test]
    fn test_layout_degenerate() {
        assert!(Node::layout(0, 1, |_, _| unreachable!()).is_empty());

        let nodes = Node::layout(3, 4, |_, _| unreachable!());
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_leaf());
        assert_eq!(nodes[0].right_child(), None);
    }
}
