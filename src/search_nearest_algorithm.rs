//! The branch-and-bound traversal shared by nearest-neighbour searches and
//! range counts.
//!
//! The traversal keeps two radii. `cull_distance` is the exact bound a point
//! must beat to be offered to the candidate callback. `node_cull_distance` is
//! `cull_distance` shrunk by the bijected `1 + max_relative_error`, and is the
//! bound a node's lower-bound distance must not exceed to be visited. Pruning
//! nodes with the smaller radius is what makes a search approximate.
//!
//! A child's lower bound is derived from its parent's by replacing the single
//! contribution of the split axis, so descending costs O(1) regardless of the
//! dimension.

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::accept::{Accept, AcceptAll};
use crate::bound::interval_distance;
use crate::error::{Error, Result};
use crate::norm_bijection::{Euclidean, NormBijection};
use crate::point_kdtree::PointKdTree;
use crate::search_algorithm::{DepthFirst, SearchAlgorithm, SearchInstance, SearchState};
use crate::types::{Axis, PointId};

/// Bucket size used when a query does not set one.
pub const DEFAULT_BUCKET_SIZE: usize = 16;

/// Slack applied to cull suggestions so that points tied with the current
/// k-th nearest distance are not culled.
const PROTECTIVE_FACTOR: f64 = 1.01;

/// Counters describing the work done by one traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// nodes popped and not culled
    pub nodes_visited: usize,
    /// visible points whose distance was computed
    pub points_examined: usize,
}

/// Settings shared by [`SearchNearest`](crate::search_nearest::SearchNearest)
/// and [`CountNearest`](crate::count_nearest::CountNearest).
#[derive(Clone, Debug)]
pub struct QueryConfig<A, N = Euclidean, S = DepthFirst, P = AcceptAll> {
    pub(crate) norm_bijection: N,
    pub(crate) search_algorithm: S,
    pub(crate) accept: P,
    pub(crate) max_distance: A,
    pub(crate) max_relative_error: A,
    pub(crate) bucket_size: usize,
    pub(crate) time_intervals: Option<Vec<usize>>,
}

impl<A: Axis> Default for QueryConfig<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Axis> QueryConfig<A> {
    /// Whole time line, unbounded radius, exact search, Euclidean norm,
    /// depth-first traversal, every point accepted.
    pub fn new() -> Self {
        QueryConfig {
            norm_bijection: Euclidean,
            search_algorithm: DepthFirst,
            accept: AcceptAll,
            max_distance: A::infinity(),
            max_relative_error: A::zero(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            time_intervals: None,
        }
    }
}

impl<A: Axis, N, S, P> QueryConfig<A, N, S, P> {
    pub(crate) fn with_norm_bijection<N2>(self, norm_bijection: N2) -> QueryConfig<A, N2, S, P> {
        QueryConfig {
            norm_bijection,
            search_algorithm: self.search_algorithm,
            accept: self.accept,
            max_distance: self.max_distance,
            max_relative_error: self.max_relative_error,
            bucket_size: self.bucket_size,
            time_intervals: self.time_intervals,
        }
    }

    pub(crate) fn with_search_algorithm<S2>(
        self,
        search_algorithm: S2,
    ) -> QueryConfig<A, N, S2, P> {
        QueryConfig {
            norm_bijection: self.norm_bijection,
            search_algorithm,
            accept: self.accept,
            max_distance: self.max_distance,
            max_relative_error: self.max_relative_error,
            bucket_size: self.bucket_size,
            time_intervals: self.time_intervals,
        }
    }

    pub(crate) fn with_accept<P2>(self, accept: P2) -> QueryConfig<A, N, S, P2> {
        QueryConfig {
            norm_bijection: self.norm_bijection,
            search_algorithm: self.search_algorithm,
            accept,
            max_distance: self.max_distance,
            max_relative_error: self.max_relative_error,
            bucket_size: self.bucket_size,
            time_intervals: self.time_intervals,
        }
    }

    /// The bijected search radius.
    pub fn max_distance(&self) -> A {
        self.max_distance
    }

    /// The allowed relative error of the norm distance.
    pub fn max_relative_error(&self) -> A {
        self.max_relative_error
    }

    /// The brute-force threshold.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_distance.is_nan() {
            return Err(Error::NotANumber("max_distance"));
        }
        if self.max_distance < A::zero() {
            return Err(Error::NegativeMaxDistance);
        }
        if self.max_relative_error.is_nan() {
            return Err(Error::NotANumber("max_relative_error"));
        }
        if self.max_relative_error < A::zero() {
            return Err(Error::NegativeRelativeError);
        }
        if let Some(stamps) = &self.time_intervals {
            if stamps.windows(2).any(|pair| pair[0] > pair[1]) {
                return Err(Error::UnorderedTimeIntervals);
            }
        }
        Ok(())
    }
}

/// Maps the configured stamp intervals onto index pairs of the root's time
/// line. An odd-length sequence leaves its last interval open-ended.
fn root_index_sequence<A: Axis, const K: usize>(
    tree: &PointKdTree<A, K>,
    time_intervals: Option<&[usize]>,
) -> Vec<usize> {
    match time_intervals {
        None => vec![0, tree.resident()],
        Some(stamps) => {
            let mut sequence: Vec<usize> = stamps
                .iter()
                .map(|&stamp| tree.time_to_index(stamp))
                .collect();
            if sequence.len() % 2 == 1 {
                sequence.push(tree.resident());
            }
            sequence
        }
    }
}

/// Runs the traversal, calling `candidate(distance, point)` for every
/// accepted point strictly inside the current cull distance. The callback
/// returns its suggestion for the new cull distance (`+inf` to keep it).
///
/// `config` must have been validated.
pub(crate) fn search_nearest_algorithm<'t, A, const K: usize, N, S, P, F>(
    tree: &'t PointKdTree<A, K>,
    query: &[A; K],
    config: &QueryConfig<A, N, S, P>,
    mut candidate: F,
) -> SearchStats
where
    A: Axis,
    N: NormBijection<A>,
    S: SearchAlgorithm<'t, A, K>,
    P: Accept,
    F: FnMut(A, PointId) -> A,
{
    let mut stats = SearchStats::default();
    if config.max_distance <= A::zero() || tree.is_empty() {
        return stats;
    }

    let norm = &config.norm_bijection;
    let root_distance = tree.bound().distance(norm, query);
    if root_distance >= config.max_distance {
        return stats;
    }

    let protective_factor = norm.scaling_factor(A::from_f64(PROTECTIVE_FACTOR));
    let error_factor = A::one() / norm.scaling_factor(A::one() + config.max_relative_error);
    let shrink = |cull: A| {
        if error_factor > A::zero() {
            cull * error_factor
        } else {
            A::zero()
        }
    };

    let mut cull_distance = config.max_distance;
    let mut node_cull_distance = shrink(cull_distance);

    let mut instance = config.search_algorithm.instance();
    let root = SearchState {
        cursor: tree.root(),
        distance: root_distance,
        index_sequence: root_index_sequence(tree, config.time_intervals.as_deref()),
    };
    if instance.skip_node(&root) {
        return stats;
    }
    instance.insert_node(root);

    while instance.nodes_left() {
        let Some(state) = instance.next_node() else {
            break;
        };

        if state.distance > node_cull_distance {
            if instance.break_on_culling() {
                break;
            }
            continue;
        }
        stats.nodes_visited += 1;

        let cursor = state.cursor;
        if cursor.leaf() || instance.should_search_split_node(&state, config.bucket_size) {
            cursor.point_set_sequence(&state.index_sequence, &mut |points: &'t [PointId]| {
                for &point in points {
                    let Ok(record) = tree.record(point) else {
                        continue;
                    };
                    if record.hidden {
                        continue;
                    }
                    stats.points_examined += 1;

                    let distance = norm.distance_with_cutoff(query, &record.point, cull_distance);
                    if distance >= cull_distance || !config.accept.accept(point) {
                        continue;
                    }

                    let suggestion = candidate(distance, point) * protective_factor;
                    if suggestion < cull_distance {
                        cull_distance = suggestion;
                        node_cull_distance = shrink(cull_distance);
                    }
                }
            });
            continue;
        }

        let (Some(axis), Some(left), Some(right)) =
            (cursor.split_axis(), cursor.left(), cursor.right())
        else {
            continue;
        };

        let x = query[axis];
        // both children carry the same previous interval
        let old_axis_distance = norm.axis(interval_distance(x, left.prev_min(), left.prev_max()));

        let mut children = [None, None];
        for (slot, (child, right_side)) in children.iter_mut().zip([(left, false), (right, true)]) {
            if child.points() == 0 {
                continue;
            }

            let new_axis_distance = norm.axis(interval_distance(x, child.min(), child.max()));
            if new_axis_distance > node_cull_distance {
                continue;
            }

            let distance = if old_axis_distance.is_finite() {
                norm.replace_axis(state.distance, old_axis_distance, new_axis_distance)
            } else {
                state.distance
            };
            if distance > node_cull_distance {
                continue;
            }

            let child_state = SearchState {
                cursor: child,
                distance,
                index_sequence: state
                    .index_sequence
                    .iter()
                    .map(|&index| cursor.cascade(index, right_side))
                    .collect(),
            };
            if !instance.skip_node(&child_state) {
                *slot = Some(child_state);
            }
        }

        match children {
            [Some(left), Some(right)] => instance.insert_nodes(left, right),
            [Some(child), None] | [None, Some(child)] => instance.insert_node(child),
            [None, None] => {}
        }
    }

    #[cfg(feature = "tracing")]
    event!(
        Level::TRACE,
        nodes_visited = stats.nodes_visited,
        points_examined = stats.points_examined,
        cull_distance = ?cull_distance,
        "traversal finished"
    );

    stats
}
