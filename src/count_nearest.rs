//! Counting the points inside an open ball.
//!
//! # Examples
//!
//! ```rust
//! use pointkd::PointKdTree;
//! use pointkd::split_rule::SlidingMidpoint;
//!
//! let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
//! tree.insert_set((0..10).map(|i| [i as f64, 0f64]));
//! tree.refine(&SlidingMidpoint, 2).unwrap();
//!
//! // squared euclidean distances strictly below 4 from the origin: x = 0 and 1
//! let count = tree.count_nearest(&[0f64, 0f64]).max_distance(4f64).run().unwrap();
//! assert_eq!(count, 2);
//! ```

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::accept::{Accept, AcceptAll};
use crate::error::Result;
use crate::norm_bijection::{Euclidean, NormBijection};
use crate::point_kdtree::PointKdTree;
use crate::search_algorithm::{DepthFirst, SearchAlgorithm};
use crate::search_nearest_algorithm::{search_nearest_algorithm, QueryConfig, SearchStats};
use crate::types::{Axis, PointId};

/// Builder of a range count. Created by [`PointKdTree::count_nearest`].
///
/// Counts the visible, accepted points at a bijected distance strictly below
/// `max_distance`. With a nonzero `max_relative_error`, points within the
/// relative error of the boundary may be missed.
pub struct CountNearest<'t, A: Axis, const K: usize, N = Euclidean, S = DepthFirst, P = AcceptAll> {
    tree: &'t PointKdTree<A, K>,
    query: [A; K],
    config: QueryConfig<A, N, S, P>,
}

impl<'t, A: Axis, const K: usize> CountNearest<'t, A, K> {
    pub(crate) fn new(tree: &'t PointKdTree<A, K>, query: [A; K]) -> Self {
        CountNearest {
            tree,
            query,
            config: QueryConfig::new(),
        }
    }
}

impl<'t, A: Axis, const K: usize, N, S, P> CountNearest<'t, A, K, N, S, P> {
    /// Only points for which `accept` returns true are counted.
    pub fn accept<P2: Accept>(self, accept: P2) -> CountNearest<'t, A, K, N, S, P2> {
        CountNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_accept(accept),
        }
    }

    /// The norm distances are measured in. Default: [`Euclidean`].
    pub fn norm_bijection<N2: NormBijection<A>>(
        self,
        norm_bijection: N2,
    ) -> CountNearest<'t, A, K, N2, S, P> {
        CountNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_norm_bijection(norm_bijection),
        }
    }

    /// The order nodes are visited in. Default: [`DepthFirst`].
    pub fn search_algorithm<S2>(self, search_algorithm: S2) -> CountNearest<'t, A, K, N, S2, P> {
        CountNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_search_algorithm(search_algorithm),
        }
    }

    /// Radius of the ball, as a bijected distance. Default: `+inf`.
    pub fn max_distance(mut self, max_distance: A) -> Self {
        self.config.max_distance = max_distance;
        self
    }

    /// Relative error allowed at the boundary of the ball. Default: 0.
    pub fn max_relative_error(mut self, max_relative_error: A) -> Self {
        self.config.max_relative_error = max_relative_error;
        self
    }

    /// Brute-force threshold. Default: 16.
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.config.bucket_size = bucket_size;
        self
    }

    /// Restricts the count to points inserted within the given stamp
    /// intervals, as for
    /// [`SearchNearest::time_intervals`](crate::search_nearest::SearchNearest::time_intervals).
    pub fn time_intervals(mut self, stamps: &[usize]) -> Self {
        self.config.time_intervals = Some(stamps.to_vec());
        self
    }
}

impl<'t, A, const K: usize, N, S, P> CountNearest<'t, A, K, N, S, P>
where
    A: Axis,
    N: NormBijection<A>,
    S: SearchAlgorithm<'t, A, K>,
    P: Accept,
{
    /// Runs the count.
    pub fn run(self) -> Result<usize> {
        self.run_with_stats().map(|(count, _)| count)
    }

    /// As [`CountNearest::run`], also returning traversal counters.
    pub fn run_with_stats(self) -> Result<(usize, SearchStats)> {
        self.config.validate()?;

        let mut count = 0;
        let stats = search_nearest_algorithm(self.tree, &self.query, &self.config, |_, _| {
            count += 1;
            A::infinity()
        });

        #[cfg(feature = "tracing")]
        event!(Level::TRACE, count, nodes_visited = stats.nodes_visited, "count_nearest finished");

        Ok((count, stats))
    }
}

impl<A: Axis, const K: usize> PointKdTree<A, K> {
    /// Starts building a range count around `query`.
    pub fn count_nearest(&self, query: &[A; K]) -> CountNearest<'_, A, K> {
        CountNearest::new(self, *query)
    }

    /// Starts building a range count around a stored point. The point itself
    /// is counted unless excluded with
    /// [`AcceptExcept`](crate::accept::AcceptExcept).
    pub fn count_nearest_from(&self, point: PointId) -> Result<CountNearest<'_, A, K>> {
        let query = self.record(point)?.point;
        Ok(CountNearest::new(self, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accept::AcceptExcept;
    use crate::norm_bijection::{Manhattan, Maximum};
    use crate::search_algorithm::BestFirst;
    use crate::split_rule::SlidingMidpoint;
    use crate::Error;
    use rstest::rstest;

    fn grid() -> PointKdTree<f64, 2> {
        let mut tree = PointKdTree::new();
        tree.insert_set((0..100).map(|i| [(i % 10) as f64, (i / 10) as f64]));
        tree.refine(&SlidingMidpoint, 4).unwrap();
        tree
    }

    #[rstest]
    #[case(0.5f64, 1)]
    #[case(1.5f64, 5)]
    #[case(2.5f64, 9)]
    #[case(4.5f64, 13)]
    fn euclidean_ball_counts(#[case] radius_squared: f64, #[case] expected: usize) {
        let tree = grid();
        let count = tree
            .count_nearest(&[5f64, 5f64])
            .max_distance(radius_squared)
            .run()
            .unwrap();
        assert_eq!(count, expected);
    }

    #[test]
    fn norms_and_strategies_agree_with_brute_force() {
        let tree = grid();
        let query = [3.2f64, 6.9f64];
        let brute = |f: &dyn Fn(&[f64; 2]) -> f64, r: f64| {
            (0..100)
                .filter(|&i| f(&[(i % 10) as f64, (i / 10) as f64]) < r)
                .count()
        };

        let manhattan = tree
            .count_nearest(&query)
            .norm_bijection(Manhattan)
            .search_algorithm(BestFirst)
            .max_distance(3f64)
            .run()
            .unwrap();
        assert_eq!(manhattan, brute(&|p: &[f64; 2]| Manhattan.distance(&query, p), 3f64));

        let maximum = tree
            .count_nearest(&query)
            .norm_bijection(Maximum)
            .max_distance(2f64)
            .run()
            .unwrap();
        assert_eq!(maximum, brute(&|p: &[f64; 2]| Maximum.distance(&query, p), 2f64));
    }

    #[test]
    fn from_stored_point_can_exclude_itself() {
        let mut tree = PointKdTree::new();
        let ids = tree.insert_set([[0f64], [1f64], [2f64]]);
        tree.refine(&SlidingMidpoint, 1).unwrap();

        let with_self = tree.count_nearest_from(ids[1]).unwrap().max_distance(1.5f64).run();
        assert_eq!(with_self, Ok(3));

        let without_self = tree
            .count_nearest_from(ids[1])
            .unwrap()
            .accept(AcceptExcept(ids[1]))
            .max_distance(1.5f64)
            .run();
        assert_eq!(without_self, Ok(2));
    }

    #[test]
    fn hidden_points_and_time_windows_are_excluded() {
        let mut tree = grid();
        let first = tree.point_ids().next().unwrap();
        tree.hide(first).unwrap();
        assert_eq!(tree.count_nearest(&[0f64, 0f64]).run(), Ok(99));
        assert_eq!(
            tree.count_nearest(&[0f64, 0f64]).time_intervals(&[0, 10]).run(),
            Ok(9)
        );
        assert_eq!(
            tree.count_nearest(&[0f64, 0f64]).time_intervals(&[90]).run(),
            Ok(10)
        );
    }

    #[test]
    fn zero_radius_counts_nothing() {
        let tree = grid();
        let (count, stats) = tree
            .count_nearest(&[5f64, 5f64])
            .max_distance(0f64)
            .run_with_stats()
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(stats, SearchStats::default());
    }

    #[test]
    fn negative_radius_is_an_error() {
        let tree = grid();
        assert_eq!(
            tree.count_nearest(&[5f64, 5f64]).max_distance(-2f64).run(),
            Err(Error::NegativeMaxDistance)
        );
    }
}
