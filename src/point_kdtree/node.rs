use crate::types::{Axis, NodeId, PointId};

/// A point owned by the tree.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PointRecord<A, const K: usize> {
    pub(crate) point: [A; K],
    pub(crate) leaf: NodeId,
    pub(crate) hidden: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeKind<A> {
    /// The resident points of the leaf, hidden ones included, in stamp order.
    Leaf { items: Vec<PointId> },
    /// `cascade[i]` is the number of the first `i` resident points of this
    /// subtree (in stamp order) that went to the left child.
    Split {
        axis: usize,
        position: A,
        left: NodeId,
        right: NodeId,
        cascade: Vec<usize>,
    },
}

impl<A> NodeKind<A> {
    pub(crate) fn leaf_items(&self) -> &[PointId] {
        match self {
            NodeKind::Leaf { items } => items,
            NodeKind::Split { .. } => &[],
        }
    }
}

/// `min`/`max` cover the visible points of the subtree along the split axis
/// of the parent. `prev_min`/`prev_max` record the interval the parent's own
/// distance was measured against along that same axis. Both pairs are unused
/// on the root.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node<A> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) min: A,
    pub(crate) max: A,
    pub(crate) prev_min: A,
    pub(crate) prev_max: A,
    pub(crate) points: usize,
    pub(crate) kind: NodeKind<A>,
}

impl<A: Axis> Node<A> {
    pub(crate) fn leaf(parent: Option<NodeId>, items: Vec<PointId>, points: usize) -> Self {
        Node {
            parent,
            min: A::infinity(),
            max: A::neg_infinity(),
            prev_min: A::infinity(),
            prev_max: A::neg_infinity(),
            points,
            kind: NodeKind::Leaf { items },
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Number of resident points in the subtree, hidden ones included.
    pub(crate) fn resident(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { items } => items.len(),
            NodeKind::Split { cascade, .. } => cascade.len() - 1,
        }
    }

    pub(crate) fn split_axis(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Split { axis, .. } => Some(axis),
            NodeKind::Leaf { .. } => None,
        }
    }

    pub(crate) fn extend(&mut self, x: A) {
        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }
}
