//! Node-visiting strategies for the nearest-neighbour traversal.
//!
//! A strategy decides in which order the pending nodes of a search are
//! visited, and whether a node whose lower bound exceeds the cull distance
//! ends the whole search or only that branch.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::point_kdtree::Cursor;
use crate::types::Axis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pending node of a search.
#[derive(Clone, Debug)]
pub struct SearchState<'t, A: Axis, const K: usize> {
    /// the node to visit
    pub cursor: Cursor<'t, A, K>,
    /// lower bound of the bijected distance from the query point to any
    /// point of the node
    pub distance: A,
    /// flattened `[begin, end)` pairs of indices into the node's time line
    pub index_sequence: Vec<usize>,
}

impl<A: Axis, const K: usize> SearchState<'_, A, K> {
    /// Number of stored points of the node that fall inside the time window.
    pub fn window_len(&self) -> usize {
        self.index_sequence
            .chunks_exact(2)
            .map(|range| range[1].saturating_sub(range[0]))
            .sum()
    }
}

/// A node-visiting strategy. Creates one fresh [`SearchInstance`] per query.
pub trait SearchAlgorithm<'t, A: Axis, const K: usize> {
    /// The per-query state of the strategy.
    type Instance: SearchInstance<'t, A, K>;

    /// Starts a new query.
    fn instance(&self) -> Self::Instance;
}

/// The per-query node container of a [`SearchAlgorithm`].
pub trait SearchInstance<'t, A: Axis, const K: usize> {
    /// Returns true while nodes are pending.
    fn nodes_left(&self) -> bool;

    /// Removes the next node to visit.
    fn next_node(&mut self) -> Option<SearchState<'t, A, K>>;

    /// Adds a pending node.
    fn insert_node(&mut self, state: SearchState<'t, A, K>);

    /// Adds both children of a split node.
    fn insert_nodes(&mut self, left: SearchState<'t, A, K>, right: SearchState<'t, A, K>) {
        self.insert_node(left);
        self.insert_node(right);
    }

    /// If true, the first visited node beyond the cull distance ends the search.
    /// Otherwise such a node is skipped and the search goes on.
    fn break_on_culling(&self) -> bool;

    /// Returns true if a split node is small enough to scan its points
    /// directly instead of descending further.
    fn should_search_split_node(&self, state: &SearchState<'t, A, K>, bucket_size: usize) -> bool {
        state.window_len() <= bucket_size
    }

    /// Returns true if a node can be discarded without visiting it.
    fn skip_node(&self, state: &SearchState<'t, A, K>) -> bool {
        state.window_len() == 0
    }
}

/// Visits nodes depth-first, nearer child first.
///
/// A popped node beyond the cull distance only prunes its own branch, because
/// nodes deeper in the stack may still be closer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DepthFirst;

/// Visits nodes in order of increasing lower-bound distance.
///
/// Once the closest pending node is beyond the cull distance, so is every other
/// pending node, and the search stops.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BestFirst;

/// Per-query stack of [`DepthFirst`].
#[derive(Debug)]
pub struct DepthFirstInstance<'t, A: Axis, const K: usize> {
    stack: Vec<SearchState<'t, A, K>>,
}

impl<'t, A: Axis + 't, const K: usize> SearchAlgorithm<'t, A, K> for DepthFirst {
    type Instance = DepthFirstInstance<'t, A, K>;

    fn instance(&self) -> Self::Instance {
        DepthFirstInstance {
            stack: Vec::with_capacity(64),
        }
    }
}

impl<'t, A: Axis, const K: usize> SearchInstance<'t, A, K> for DepthFirstInstance<'t, A, K> {
    fn nodes_left(&self) -> bool {
        !self.stack.is_empty()
    }

    fn next_node(&mut self) -> Option<SearchState<'t, A, K>> {
        self.stack.pop()
    }

    fn insert_node(&mut self, state: SearchState<'t, A, K>) {
        self.stack.push(state);
    }

    fn insert_nodes(&mut self, left: SearchState<'t, A, K>, right: SearchState<'t, A, K>) {
        if left.distance < right.distance {
            self.stack.push(right);
            self.stack.push(left);
        } else {
            self.stack.push(left);
            self.stack.push(right);
        }
    }

    fn break_on_culling(&self) -> bool {
        false
    }
}

/// A pending node ordered so that `BinaryHeap` pops the smallest distance.
#[derive(Debug)]
struct Frontier<'t, A: Axis, const K: usize>(SearchState<'t, A, K>);

impl<A: Axis, const K: usize> Ord for Frontier<'_, A, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(other.0.distance).cmp(&OrderedFloat(self.0.distance))
    }
}

impl<A: Axis, const K: usize> PartialOrd for Frontier<'_, A, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Axis, const K: usize> Eq for Frontier<'_, A, K> {}

impl<A: Axis, const K: usize> PartialEq for Frontier<'_, A, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// Per-query priority queue of [`BestFirst`].
#[derive(Debug)]
pub struct BestFirstInstance<'t, A: Axis, const K: usize> {
    queue: BinaryHeap<Frontier<'t, A, K>>,
}

impl<'t, A: Axis + 't, const K: usize> SearchAlgorithm<'t, A, K> for BestFirst {
    type Instance = BestFirstInstance<'t, A, K>;

    fn instance(&self) -> Self::Instance {
        BestFirstInstance {
            queue: BinaryHeap::with_capacity(64),
        }
    }
}

impl<'t, A: Axis, const K: usize> SearchInstance<'t, A, K> for BestFirstInstance<'t, A, K> {
    fn nodes_left(&self) -> bool {
        !self.queue.is_empty()
    }

    fn next_node(&mut self) -> Option<SearchState<'t, A, K>> {
        self.queue.pop().map(|frontier| frontier.0)
    }

    fn insert_node(&mut self, state: SearchState<'t, A, K>) {
        self.queue.push(Frontier(state));
    }

    fn break_on_culling(&self) -> bool {
        true
    }
}
