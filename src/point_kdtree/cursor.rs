use std::fmt;

use crate::point_kdtree::node::{Node, NodeKind};
use crate::point_kdtree::PointKdTree;
use crate::types::{Axis, NodeId, PointId};

/// A read-only handle to a node of a [`PointKdTree`].
///
/// Cursors borrow the tree, so the tree cannot change while one is alive.
#[derive(Clone, Copy)]
pub struct Cursor<'t, A: Axis, const K: usize> {
    tree: &'t PointKdTree<A, K>,
    id: NodeId,
}

impl<A: Axis, const K: usize> fmt::Debug for Cursor<'_, A, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("points", &self.points())
            .field("leaf", &self.leaf())
            .finish()
    }
}

impl<A: Axis, const K: usize> PartialEq for Cursor<'_, A, K> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'t, A: Axis, const K: usize> Cursor<'t, A, K> {
    pub(crate) fn new(tree: &'t PointKdTree<A, K>, id: NodeId) -> Self {
        Cursor { tree, id }
    }

    fn node(&self) -> &'t Node<A> {
        self.tree.node(self.id)
    }

    fn at(&self, id: NodeId) -> Self {
        Cursor::new(self.tree, id)
    }

    /// The handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Number of visible points in the subtree.
    pub fn points(&self) -> usize {
        self.node().points
    }

    /// Number of stored points in the subtree, hidden ones included. This is
    /// the length of the subtree's time line.
    pub fn resident(&self) -> usize {
        self.node().resident()
    }

    /// Returns true if the node has no children.
    pub fn leaf(&self) -> bool {
        self.node().is_leaf()
    }

    /// The parent node, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|id| self.at(id))
    }

    /// The child holding points below the split position.
    pub fn left(&self) -> Option<Self> {
        self.child(false)
    }

    /// The child holding points at or above the split position.
    pub fn right(&self) -> Option<Self> {
        self.child(true)
    }

    /// The left (`right == false`) or right child.
    pub fn child(&self, right: bool) -> Option<Self> {
        match &self.node().kind {
            NodeKind::Split {
                left, right: r, ..
            } => Some(self.at(if right { *r } else { *left })),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The axis the children are split along.
    pub fn split_axis(&self) -> Option<usize> {
        self.node().split_axis()
    }

    /// The coordinate the children are split at.
    pub fn split_position(&self) -> Option<A> {
        match self.node().kind {
            NodeKind::Split { position, .. } => Some(position),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Lower end of the node's interval along its parent's split axis.
    pub fn min(&self) -> A {
        self.node().min
    }

    /// Upper end of the node's interval along its parent's split axis.
    pub fn max(&self) -> A {
        self.node().max
    }

    /// Lower end of the interval the parent was bounded by along the same
    /// axis when the tree was last refined.
    pub fn prev_min(&self) -> A {
        self.node().prev_min
    }

    /// Upper end of the interval the parent was bounded by along the same
    /// axis when the tree was last refined.
    pub fn prev_max(&self) -> A {
        self.node().prev_max
    }

    /// The stored points of a leaf in insertion order. Empty for split nodes.
    pub fn leaf_points(&self) -> &'t [PointId] {
        match &self.node().kind {
            NodeKind::Leaf { items } => items,
            NodeKind::Split { .. } => &[],
        }
    }

    /// Maps an index into this subtree's time line to the index of the first
    /// not-earlier point in the left (`right == false`) or right child's time
    /// line. Leaves map every index to itself.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointkd::PointKdTree;
    /// use pointkd::split_rule::SlidingMidpoint;
    ///
    /// let mut tree: PointKdTree<f64, 1> = PointKdTree::new();
    /// tree.insert_set([[0f64], [10f64], [1f64], [11f64]]);
    /// tree.refine(&SlidingMidpoint, 2).unwrap();
    ///
    /// let root = tree.root();
    /// assert_eq!(root.cascade(3, false), 2);
    /// assert_eq!(root.cascade(3, true), 1);
    /// ```
    pub fn cascade(&self, index: usize, right: bool) -> usize {
        match &self.node().kind {
            NodeKind::Split { cascade, .. } => {
                let left = cascade[index];
                if right {
                    index - left
                } else {
                    left
                }
            }
            NodeKind::Leaf { .. } => index,
        }
    }

    /// Visits the stored points of the time-line range `begin..end` of this
    /// subtree. `visitor` is called once per leaf that holds points of the
    /// range, with the matching sub-slice of that leaf.
    pub fn point_set<F>(&self, begin: usize, end: usize, visitor: &mut F)
    where
        F: FnMut(&'t [PointId]),
    {
        if begin >= end {
            return;
        }
        match &self.node().kind {
            NodeKind::Leaf { items } => visitor(&items[begin..end]),
            NodeKind::Split {
                left,
                right,
                cascade,
                ..
            } => {
                let (left_begin, left_end) = (cascade[begin], cascade[end]);
                self.at(*left).point_set(left_begin, left_end, visitor);
                self.at(*right)
                    .point_set(begin - left_begin, end - left_end, visitor);
            }
        }
    }

    /// Visits every `[begin, end)` range of a flattened index sequence.
    pub fn point_set_sequence<F>(&self, index_sequence: &[usize], visitor: &mut F)
    where
        F: FnMut(&'t [PointId]),
    {
        for range in index_sequence.chunks_exact(2) {
            self.point_set(range[0], range[1], visitor);
        }
    }
}
