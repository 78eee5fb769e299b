//! An adaptive point k-d tree.
//!
//! Points are inserted into a flat tree (a single leaf) and the tree is then
//! subdivided with [`PointKdTree::refine`]. Unlike a classic k-d tree, every
//! node stores the tight interval of its visible points along the split axis
//! of its parent, so empty space is cut away and queries can bound distances
//! more closely.
//!
//! The points of each subtree are kept in insertion order, and each split node
//! records how that order is partitioned between its children. This lets a
//! query restrict itself to points inserted within given time windows, see
//! [`SearchNearest::time_intervals`](crate::search_nearest::SearchNearest::time_intervals).

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::bound::AlignedBox;
use crate::error::{Error, Result};
use crate::types::{Axis, NodeId, PointId};

mod cursor;
pub(crate) mod node;
mod refine;

pub use cursor::Cursor;
use node::{Node, NodeKind, PointRecord};

/// A point k-d tree over `K`-dimensional points with coordinates of type `A`.
///
/// # Examples
///
/// ```rust
/// use pointkd::PointKdTree;
/// use pointkd::split_rule::SlidingMidpoint;
///
/// let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
/// let a = tree.insert([0f64, 0f64]);
/// let b = tree.insert([1f64, 1f64]);
/// tree.insert([5f64, 5f64]);
///
/// tree.refine(&SlidingMidpoint, 1).unwrap();
/// assert_eq!(tree.points(), 3);
/// assert_eq!(tree.leaves(), 3);
///
/// let nearest = tree.search_nearest(&[0.2f64, 0.1f64]).run().unwrap();
/// assert_eq!(nearest.point, Some(a));
///
/// tree.hide(a).unwrap();
/// let nearest = tree.search_nearest(&[0.2f64, 0.1f64]).run().unwrap();
/// assert_eq!(nearest.point, Some(b));
/// ```
#[derive(Clone, Debug)]
pub struct PointKdTree<A: Axis, const K: usize> {
    pub(crate) records: Vec<Option<PointRecord<A, K>>>,
    pub(crate) resident: Vec<PointId>,
    pub(crate) nodes: Vec<Node<A>>,
    pub(crate) free_nodes: Vec<NodeId>,
    pub(crate) root: NodeId,
    pub(crate) bound: AlignedBox<A, K>,
    pub(crate) visible: usize,
    pub(crate) leaves: usize,
    pub(crate) simulate_kd_tree: bool,
}

impl<A: Axis, const K: usize> Default for PointKdTree<A, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Axis, const K: usize> PointKdTree<A, K> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        PointKdTree {
            records: Vec::with_capacity(capacity),
            resident: Vec::with_capacity(capacity),
            nodes: vec![Node::leaf(None, Vec::with_capacity(capacity), 0)],
            free_nodes: Vec::new(),
            root: NodeId(0),
            bound: AlignedBox::empty(),
            visible: 0,
            leaves: 1,
            simulate_kd_tree: false,
        }
    }

    /// Creates an empty tree whose nodes are bounded by their splitting
    /// planes rather than by the spread of their points, as in a classic
    /// k-d tree.
    pub fn simulating_kd_tree() -> Self {
        PointKdTree {
            simulate_kd_tree: true,
            ..Self::new()
        }
    }

    /// Returns true if nodes are bounded by their splitting planes.
    pub fn simulates_kd_tree(&self) -> bool {
        self.simulate_kd_tree
    }

    /// Number of visible points.
    pub fn points(&self) -> usize {
        self.visible
    }

    /// Number of stored points, hidden ones included.
    pub fn resident(&self) -> usize {
        self.resident.len()
    }

    /// Returns true if the tree has no visible points.
    pub fn is_empty(&self) -> bool {
        self.visible == 0
    }

    /// Number of leaf nodes.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// A box covering every visible point. It is tight after `refine` and is
    /// never shrunk by `hide` or `erase`.
    pub fn bound(&self) -> &AlignedBox<A, K> {
        &self.bound
    }

    /// A cursor at the root node.
    pub fn root(&self) -> Cursor<'_, A, K> {
        Cursor::new(self, self.root)
    }

    /// A cursor at the given node.
    pub fn cursor(&self, node: NodeId) -> Result<Cursor<'_, A, K>> {
        self.check_node(node)?;
        Ok(Cursor::new(self, node))
    }

    /// A cursor at the leaf holding `point`.
    pub fn leaf_of(&self, point: PointId) -> Result<Cursor<'_, A, K>> {
        let record = self.record(point)?;
        Ok(Cursor::new(self, record.leaf))
    }

    /// The coordinates of a stored point.
    pub fn point(&self, point: PointId) -> Option<&[A; K]> {
        self.record(point).ok().map(|record| &record.point)
    }

    /// Whether a stored point is hidden, or `None` if it is not stored.
    pub fn is_hidden(&self, point: PointId) -> Option<bool> {
        self.record(point).ok().map(|record| record.hidden)
    }

    /// Handles of all stored points, hidden ones included, in insertion order.
    pub fn point_ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.resident.iter().copied()
    }

    /// Maps an insertion stamp to the index of the first stored point whose
    /// stamp is at least `stamp`. Root time-window indices use this mapping.
    pub fn time_to_index(&self, stamp: usize) -> usize {
        self.resident.partition_point(|id| id.0 < stamp)
    }

    /// Adds a visible point and returns its handle.
    pub fn insert(&mut self, point: [A; K]) -> PointId {
        self.insert_with(point, false)
    }

    /// Adds a point that stays hidden until [`PointKdTree::show`] is called.
    pub fn insert_hidden(&mut self, point: [A; K]) -> PointId {
        self.insert_with(point, true)
    }

    /// Adds a set of visible points. The returned handles follow the order of
    /// the input.
    pub fn insert_set<I>(&mut self, points: I) -> Vec<PointId>
    where
        I: IntoIterator<Item = [A; K]>,
    {
        let points = points.into_iter();
        let (lower, _) = points.size_hint();
        self.records.reserve(lower);
        self.resident.reserve(lower);
        points.map(|point| self.insert(point)).collect()
    }

    fn insert_with(&mut self, point: [A; K], hidden: bool) -> PointId {
        let id = PointId(self.records.len());
        let mut node_id = self.root;

        loop {
            let node = &mut self.nodes[node_id.0];
            if !hidden {
                node.points += 1;
            }
            let (axis, child) = match &mut node.kind {
                NodeKind::Leaf { items } => {
                    items.push(id);
                    break;
                }
                NodeKind::Split {
                    axis,
                    position,
                    left,
                    right,
                    cascade,
                } => {
                    let goes_left = point[*axis] < *position;
                    let before = cascade.last().copied().unwrap_or(0);
                    cascade.push(before + usize::from(goes_left));
                    (*axis, if goes_left { *left } else { *right })
                }
            };
            if !hidden {
                self.nodes[child.0].extend(point[axis]);
            }
            node_id = child;
        }

        if !hidden {
            self.bound.extend(&point);
            self.visible += 1;
        }
        self.records.push(Some(PointRecord {
            point,
            leaf: node_id,
            hidden,
        }));
        self.resident.push(id);
        id
    }

    /// Excludes a point from queries without removing it from the tree.
    /// Hiding a hidden point does nothing.
    pub fn hide(&mut self, point: PointId) -> Result<()> {
        self.record(point)?;
        self.hide_resident(point);
        Ok(())
    }

    /// Makes a hidden point visible to queries again.
    /// Showing a visible point does nothing.
    pub fn show(&mut self, point: PointId) -> Result<()> {
        self.record(point)?;
        self.show_resident(point);
        Ok(())
    }

    /// Hides every stored point.
    pub fn hide_all(&mut self) {
        for record in self.records.iter_mut().flatten() {
            record.hidden = true;
        }
        for node in self.nodes.iter_mut() {
            node.points = 0;
        }
        self.visible = 0;
    }

    /// Shows every stored point.
    pub fn show_all(&mut self) {
        for index in 0..self.resident.len() {
            let point = self.resident[index];
            self.show_resident(point);
        }
    }

    /// Removes a point from the tree and returns its coordinates. The node
    /// structure is left as it is.
    pub fn erase(&mut self, point: PointId) -> Result<[A; K]> {
        let record = self.record(point)?;
        let (leaf, hidden, coordinates) = (record.leaf, record.hidden, record.point);
        let root_index = self
            .resident
            .binary_search(&point)
            .map_err(|_| Error::UnknownPoint(point))?;

        let path = self.path_from_root(leaf);
        let mut index = root_index;
        for (depth, &node_id) in path.iter().enumerate() {
            let node = &mut self.nodes[node_id.0];
            if !hidden {
                node.points -= 1;
            }
            match &mut node.kind {
                NodeKind::Leaf { items } => {
                    debug_assert_eq!(items[index], point);
                    items.remove(index);
                }
                NodeKind::Split { left, cascade, .. } => {
                    let goes_left = path[depth + 1] == *left;
                    let child_index = if goes_left {
                        cascade[index]
                    } else {
                        index - cascade[index]
                    };
                    cascade.remove(index + 1);
                    if goes_left {
                        for count in cascade[index + 1..].iter_mut() {
                            *count -= 1;
                        }
                    }
                    index = child_index;
                }
            }
        }

        self.resident.remove(root_index);
        self.records[point.0] = None;
        if !hidden {
            self.visible -= 1;
        }
        Ok(coordinates)
    }

    /// Removes every point, keeping the node structure.
    pub fn erase_all(&mut self) {
        for node in self.nodes.iter_mut() {
            node.points = 0;
            match &mut node.kind {
                NodeKind::Leaf { items } => items.clear(),
                NodeKind::Split { cascade, .. } => {
                    cascade.clear();
                    cascade.push(0);
                }
            }
        }
        for record in self.records.iter_mut() {
            *record = None;
        }
        self.resident.clear();
        self.visible = 0;
    }

    /// Removes every point and node, leaving an empty flat tree. Handles
    /// issued before the call must not be used afterwards.
    pub fn clear(&mut self) {
        let simulate_kd_tree = self.simulate_kd_tree;
        *self = Self::new();
        self.simulate_kd_tree = simulate_kd_tree;
    }

    pub(crate) fn record(&self, point: PointId) -> Result<&PointRecord<A, K>> {
        self.records
            .get(point.0)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownPoint(point))
    }

    pub(crate) fn node(&self, node: NodeId) -> &Node<A> {
        &self.nodes[node.0]
    }

    pub(crate) fn check_node(&self, node: NodeId) -> Result<()> {
        if node.0 < self.nodes.len() && !self.free_nodes.contains(&node) {
            Ok(())
        } else {
            Err(Error::UnknownNode(node))
        }
    }

    pub(crate) fn alloc_node(&mut self, node: Node<A>) -> NodeId {
        match self.free_nodes.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// The nodes from the root down to `node`, both included.
    fn path_from_root(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Calls `f` on `node` and each of its ancestors, passing the split axis of
    /// the node's parent (`None` for the root).
    fn walk_up<F: FnMut(&mut Node<A>, Option<usize>)>(&mut self, node: NodeId, mut f: F) {
        let mut current = Some(node);
        while let Some(id) = current {
            let parent = self.nodes[id.0].parent;
            let axis = parent.and_then(|p| self.nodes[p.0].split_axis());
            f(&mut self.nodes[id.0], axis);
            current = parent;
        }
    }

    fn hide_resident(&mut self, point: PointId) {
        let Some(Some(record)) = self.records.get_mut(point.0) else {
            return;
        };
        if record.hidden {
            return;
        }
        record.hidden = true;
        let leaf = record.leaf;
        self.walk_up(leaf, |node, _| node.points -= 1);
        self.visible -= 1;

        #[cfg(feature = "tracing")]
        event!(Level::TRACE, point = point.0, "hid point");
    }

    fn show_resident(&mut self, point: PointId) {
        let Some(Some(record)) = self.records.get_mut(point.0) else {
            return;
        };
        if !record.hidden {
            return;
        }
        record.hidden = false;
        let (leaf, coordinates) = (record.leaf, record.point);
        self.walk_up(leaf, |node, axis| {
            node.points += 1;
            if let Some(axis) = axis {
                node.extend(coordinates[axis]);
            }
        });
        self.bound.extend(&coordinates);
        self.visible += 1;

        #[cfg(feature = "tracing")]
        event!(Level::TRACE, point = point.0, "showed point");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split_rule::SlidingMidpoint;
    use rand::Rng;

    fn random_tree(n: usize, bucket_size: usize) -> (PointKdTree<f64, 3>, Vec<PointId>) {
        let mut rng = rand::rng();
        let mut tree = PointKdTree::new();
        let ids = tree.insert_set(
            (0..n).map(|_| std::array::from_fn(|_| rng.random_range(-50f64..50f64))),
        );
        tree.refine(&SlidingMidpoint, bucket_size).unwrap();
        (tree, ids)
    }

    /// Checks the structural invariants of every node reachable from the root.
    pub(crate) fn assert_consistent<const K: usize>(tree: &PointKdTree<f64, K>) {
        let mut leaves = 0;
        let mut nodes = 0;
        let mut stack = vec![tree.root];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            nodes += 1;
            let node = tree.node(id);
            match &node.kind {
                NodeKind::Leaf { items } => {
                    leaves += 1;
                    assert!(items.windows(2).all(|w| w[0] < w[1]), "leaf out of stamp order");
                    let visible = items
                        .iter()
                        .filter(|&&p| !tree.record(p).unwrap().hidden)
                        .count();
                    assert_eq!(visible, node.points);
                    for &p in items {
                        assert_eq!(tree.record(p).unwrap().leaf, id);
                    }
                    seen.extend(items.iter().copied());
                }
                NodeKind::Split {
                    axis,
                    position,
                    left,
                    right,
                    cascade,
                } => {
                    let (l, r) = (tree.node(*left), tree.node(*right));
                    assert_eq!(l.parent, Some(id));
                    assert_eq!(r.parent, Some(id));
                    assert_eq!(node.points, l.points + r.points);
                    assert_eq!(cascade.len(), l.resident() + r.resident() + 1);
                    assert_eq!(cascade[0], 0);
                    assert_eq!(*cascade.last().unwrap(), l.resident());
                    let mut left_points = Vec::new();
                    tree.cursor(*left)
                        .unwrap()
                        .point_set(0, l.resident(), &mut |s| left_points.extend_from_slice(s));
                    for p in left_points {
                        let record = tree.record(p).unwrap();
                        assert!(record.point[*axis] < *position);
                        if !record.hidden && !tree.simulate_kd_tree {
                            assert!(l.min <= record.point[*axis] && record.point[*axis] <= l.max);
                        }
                    }
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        seen.sort();
        assert_eq!(seen, tree.resident);
        assert_eq!(leaves, tree.leaves());
        assert_eq!(nodes, tree.nodes());
        assert_eq!(tree.node(tree.root).points, tree.points());
    }

    #[test]
    fn new_tree_is_flat_and_empty() {
        let tree: PointKdTree<f64, 2> = PointKdTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.points(), 0);
        assert_eq!(tree.leaves(), 1);
        assert_eq!(tree.nodes(), 1);
        assert!(tree.root().leaf());
        assert!(tree.bound().is_empty());
    }

    #[test]
    fn lifecycle_insert_refine_merge_clear() {
        let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
        let ids = tree.insert_set([[1f64, 3f64], [4f64, 1f64], [3f64, 2f64], [0f64, 0f64]]);
        assert_eq!(ids.len(), 4);
        assert_eq!(tree.points(), 4);
        assert_eq!(tree.leaves(), 1);
        assert_eq!(tree.nodes(), 1);
        assert_eq!(tree.bound().min, [0f64, 0f64]);
        assert_eq!(tree.bound().max, [4f64, 3f64]);

        tree.refine(&SlidingMidpoint, 1).unwrap();
        assert_eq!(tree.leaves(), 4);
        assert_eq!(tree.nodes(), 7);
        assert_consistent(&tree);

        tree.merge();
        assert_eq!(tree.leaves(), 1);
        assert_eq!(tree.nodes(), 1);
        assert_eq!(tree.points(), 4);
        assert_consistent(&tree);

        tree.clear();
        assert_eq!(tree.points(), 0);
        assert_eq!(tree.leaves(), 1);
        assert_eq!(tree.nodes(), 1);
        assert!(tree.point(ids[0]).is_none());
    }

    #[test]
    fn hide_and_show_track_visible_counts() {
        let (mut tree, ids) = random_tree(300, 8);
        tree.hide_all();
        assert_eq!(tree.points(), 0);
        assert_consistent(&tree);

        tree.show_all();
        assert_eq!(tree.points(), 300);
        assert_consistent(&tree);

        for id in ids.iter().step_by(3) {
            tree.hide(*id).unwrap();
            tree.hide(*id).unwrap();
        }
        assert_eq!(tree.points(), 200);
        assert_eq!(tree.resident(), 300);
        assert_eq!(tree.is_hidden(ids[0]), Some(true));
        assert_eq!(tree.is_hidden(ids[1]), Some(false));
        assert_consistent(&tree);

        tree.show(ids[0]).unwrap();
        assert_eq!(tree.points(), 201);
        assert_consistent(&tree);
    }

    #[test]
    fn show_extends_bounds_of_points_inserted_hidden() {
        let (mut tree, _) = random_tree(100, 4);
        let far = tree.insert_hidden([500f64, -500f64, 0f64]);
        assert!(!tree.bound().contains(&[500f64, -500f64, 0f64]));
        tree.show(far).unwrap();
        assert!(tree.bound().contains(&[500f64, -500f64, 0f64]));
        assert_consistent(&tree);
    }

    #[test]
    fn insert_after_refine_descends_splits() {
        let (mut tree, _) = random_tree(200, 4);
        let leaves = tree.leaves();
        let mut rng = rand::rng();
        for _ in 0..100 {
            tree.insert(std::array::from_fn(|_| rng.random_range(-80f64..80f64)));
        }
        assert_eq!(tree.leaves(), leaves);
        assert_eq!(tree.points(), 300);
        assert_consistent(&tree);
    }

    #[test]
    fn erase_removes_point_and_keeps_cascades_consistent() {
        let (mut tree, ids) = random_tree(256, 6);
        for id in ids.iter().skip(1).step_by(2) {
            tree.hide(*id).unwrap();
        }
        for id in ids.iter().step_by(3) {
            tree.erase(*id).unwrap();
        }
        assert_eq!(tree.resident(), 256 - 86);
        assert!(tree.point(ids[0]).is_none());
        assert_eq!(tree.erase(ids[0]), Err(Error::UnknownPoint(ids[0])));
        assert_consistent(&tree);
    }

    #[test]
    fn erase_all_keeps_structure() {
        let (mut tree, ids) = random_tree(100, 4);
        let nodes = tree.nodes();
        tree.erase_all();
        assert_eq!(tree.points(), 0);
        assert_eq!(tree.resident(), 0);
        assert_eq!(tree.nodes(), nodes);
        assert!(tree.point(ids[5]).is_none());
        let id = tree.insert([1f64, 2f64, 3f64]);
        assert_eq!(id.stamp(), 100);
        assert_consistent(&tree);
    }

    #[test]
    fn unknown_handles_are_rejected_without_change() {
        let (mut tree, _) = random_tree(10, 4);
        let before = tree.points();
        assert_eq!(tree.hide(PointId(99)), Err(Error::UnknownPoint(PointId(99))));
        assert_eq!(tree.show(PointId(99)), Err(Error::UnknownPoint(PointId(99))));
        assert!(tree.leaf_of(PointId(99)).is_err());
        assert!(tree.cursor(NodeId(1000)).is_err());
        assert_eq!(tree.points(), before);
    }

    #[test]
    fn time_to_index_skips_erased_stamps() {
        let mut tree: PointKdTree<f64, 1> = PointKdTree::new();
        let ids = tree.insert_set((0..10).map(|i| [i as f64]));
        tree.erase(ids[2]).unwrap();
        tree.erase(ids[3]).unwrap();
        assert_eq!(tree.time_to_index(0), 0);
        assert_eq!(tree.time_to_index(2), 2);
        assert_eq!(tree.time_to_index(4), 2);
        assert_eq!(tree.time_to_index(5), 3);
        assert_eq!(tree.time_to_index(100), 8);
    }
}
