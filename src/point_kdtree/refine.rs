#[cfg(feature = "tracing")]
use tracing::{event, span, Level};

use crate::bound::AlignedBox;
use crate::error::{Error, Result};
use crate::point_kdtree::node::{Node, NodeKind};
use crate::point_kdtree::PointKdTree;
use crate::split_rule::SplitRule;
use crate::types::{Axis, NodeId, PointId};

impl<A: Axis, const K: usize> PointKdTree<A, K> {
    /// Subdivides every leaf holding more than `bucket_size` visible points,
    /// using `split_rule` to pick the splitting planes, and recomputes the
    /// bounds of all nodes. Existing splits are kept.
    ///
    /// Handles of nodes that survive the call remain valid.
    pub fn refine<R: SplitRule<A, K>>(&mut self, split_rule: &R, bucket_size: usize) -> Result<()> {
        if bucket_size == 0 {
            return Err(Error::ZeroBucketSize);
        }

        #[cfg(feature = "tracing")]
        let span = span!(Level::TRACE, "refine", bucket_size);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        self.bound = AlignedBox::covering(
            self.records
                .iter()
                .flatten()
                .filter(|record| !record.hidden)
                .map(|record| &record.point),
        );

        let region = self.bound;
        self.refine_node(self.root, region, split_rule, bucket_size);
        self.update_prev_bounds();

        #[cfg(feature = "tracing")]
        event!(
            Level::DEBUG,
            nodes = self.nodes(),
            leaves = self.leaves,
            points = self.visible,
            "refined tree"
        );

        Ok(())
    }

    /// Collapses the whole tree into a single leaf.
    pub fn merge(&mut self) {
        self.merge_subtree(self.root);
    }

    /// Collapses the subtree under `node` into a single leaf. Handles of the
    /// removed descendants become invalid.
    pub fn merge_node(&mut self, node: NodeId) -> Result<()> {
        self.check_node(node)?;
        self.merge_subtree(node);
        Ok(())
    }

    fn merge_subtree(&mut self, node: NodeId) {
        if self.nodes[node.0].is_leaf() {
            return;
        }

        let mut items: Vec<PointId> = Vec::with_capacity(self.nodes[node.0].resident());
        let mut merged_leaves = 0;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match &mut self.nodes[id.0].kind {
                NodeKind::Leaf { items: leaf_items } => {
                    items.append(leaf_items);
                    merged_leaves += 1;
                }
                NodeKind::Split { left, right, .. } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
            if id != node {
                self.free_nodes.push(id);
            }
        }

        items.sort_unstable();
        self.relink(&items, node);
        self.nodes[node.0].kind = NodeKind::Leaf { items };
        self.leaves = self.leaves + 1 - merged_leaves;

        #[cfg(feature = "tracing")]
        event!(Level::TRACE, node = node.0, merged_leaves, "merged subtree");
    }

    /// Returns the box covering the visible points of the subtree.
    fn refine_node<R: SplitRule<A, K>>(
        &mut self,
        id: NodeId,
        region: AlignedBox<A, K>,
        split_rule: &R,
        bucket_size: usize,
    ) -> AlignedBox<A, K> {
        if self.nodes[id.0].is_leaf()
            && (self.nodes[id.0].points <= bucket_size || !self.split_leaf(id, &region, split_rule))
        {
            return self.leaf_cover(id);
        }

        let NodeKind::Split {
            axis,
            position,
            left,
            right,
            ..
        } = self.nodes[id.0].kind
        else {
            return self.leaf_cover(id);
        };

        let mut left_region = region;
        left_region.max[axis] = position;
        let mut right_region = region;
        right_region.min[axis] = position;

        let left_cover = self.refine_node(left, left_region, split_rule, bucket_size);
        let right_cover = self.refine_node(right, right_region, split_rule, bucket_size);

        if self.simulate_kd_tree {
            set_interval(&mut self.nodes[left.0], region.min[axis], position);
            set_interval(&mut self.nodes[right.0], position, region.max[axis]);
        } else {
            set_interval(&mut self.nodes[left.0], left_cover.min[axis], left_cover.max[axis]);
            set_interval(&mut self.nodes[right.0], right_cover.min[axis], right_cover.max[axis]);
        }

        let mut cover = left_cover;
        for dim in 0..K {
            cover.min[dim] = cover.min[dim].min(right_cover.min[dim]);
            cover.max[dim] = cover.max[dim].max(right_cover.max[dim]);
        }
        cover
    }

    /// Turns a leaf into a split node with two leaf children. Returns false,
    /// leaving the leaf untouched, if the split would leave either child
    /// without visible points.
    fn split_leaf<R: SplitRule<A, K>>(
        &mut self,
        id: NodeId,
        region: &AlignedBox<A, K>,
        split_rule: &R,
    ) -> bool {
        let items = match &self.nodes[id.0].kind {
            NodeKind::Leaf { items } => items.clone(),
            NodeKind::Split { .. } => return false,
        };

        let visible: Vec<[A; K]> = items
            .iter()
            .filter_map(|&point| self.record(point).ok())
            .filter(|record| !record.hidden)
            .map(|record| record.point)
            .collect();

        let Some((position, axis)) = split_rule.split(&visible, region) else {
            #[cfg(feature = "tracing")]
            event!(Level::TRACE, node = id.0, points = visible.len(), "split rule declined");
            return false;
        };

        let mut left_items = Vec::new();
        let mut right_items = Vec::new();
        let mut left_visible = 0;
        let mut right_visible = 0;
        let mut cascade = Vec::with_capacity(items.len() + 1);
        cascade.push(0);
        for &point in &items {
            let Ok(record) = self.record(point) else {
                continue;
            };
            if record.point[axis] < position {
                left_items.push(point);
                left_visible += usize::from(!record.hidden);
            } else {
                right_items.push(point);
                right_visible += usize::from(!record.hidden);
            }
            cascade.push(left_items.len());
        }

        if left_visible == 0 || right_visible == 0 {
            #[cfg(feature = "tracing")]
            event!(
                Level::TRACE,
                node = id.0,
                axis,
                position = ?position,
                "rejected one-sided split"
            );
            return false;
        }

        let left = self.alloc_node(Node::leaf(Some(id), Vec::new(), left_visible));
        let right = self.alloc_node(Node::leaf(Some(id), Vec::new(), right_visible));
        self.relink(&left_items, left);
        self.relink(&right_items, right);
        self.nodes[left.0].kind = NodeKind::Leaf { items: left_items };
        self.nodes[right.0].kind = NodeKind::Leaf { items: right_items };

        self.nodes[id.0].kind = NodeKind::Split {
            axis,
            position,
            left,
            right,
            cascade,
        };
        self.leaves += 1;
        true
    }

    fn relink(&mut self, items: &[PointId], leaf: NodeId) {
        for point in items {
            if let Some(Some(record)) = self.records.get_mut(point.0) {
                record.leaf = leaf;
            }
        }
    }

    fn leaf_cover(&self, id: NodeId) -> AlignedBox<A, K> {
        AlignedBox::covering(
            self.nodes[id.0]
                .kind
                .leaf_items()
                .iter()
                .filter_map(|&point| self.record(point).ok())
                .filter(|record| !record.hidden)
                .map(|record| &record.point),
        )
    }

    /// Records, for every non-root node, the interval its parent's distance is
    /// measured against along the parent's split axis. That is the interval of
    /// the nearest ancestor bounded along that axis, or the tree bound.
    fn update_prev_bounds(&mut self) {
        let mut stack = vec![(self.root, self.bound)];
        while let Some((id, region)) = stack.pop() {
            let NodeKind::Split {
                axis, left, right, ..
            } = self.nodes[id.0].kind
            else {
                continue;
            };
            for child in [left, right] {
                let node = &mut self.nodes[child.0];
                node.prev_min = region.min[axis];
                node.prev_max = region.max[axis];
                let mut child_region = region;
                child_region.min[axis] = node.min;
                child_region.max[axis] = node.max;
                stack.push((child, child_region));
            }
        }
    }
}

fn set_interval<A: Axis>(node: &mut Node<A>, min: A, max: A) {
    node.min = min;
    node.max = max;
}
