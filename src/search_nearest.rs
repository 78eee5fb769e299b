//! k-nearest-neighbour search over a [`PointKdTree`].
//!
//! A search is configured with a builder returned by
//! [`PointKdTree::search_nearest`]; every option has a default, and options can
//! be given in any order.
//!
//! # Examples
//!
//! ```rust
//! use pointkd::{NearestNeighbour, PointKdTree};
//! use pointkd::accept::AcceptExcept;
//! use pointkd::search_algorithm::BestFirst;
//! use pointkd::split_rule::SlidingMidpoint;
//!
//! let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
//! let ids = tree.insert_set([[0f64, 0f64], [1f64, 0f64], [0f64, 2f64], [4f64, 4f64]]);
//! tree.refine(&SlidingMidpoint, 1).unwrap();
//!
//! let mut neighbours = Vec::new();
//! let second = tree
//!     .search_nearest_from(ids[0])
//!     .unwrap()
//!     .accept(AcceptExcept(ids[0]))
//!     .search_algorithm(BestFirst)
//!     .k_nearest(2)
//!     .report(|neighbour: NearestNeighbour<f64>| neighbours.push(neighbour))
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(second.distance, 4f64);
//! assert_eq!(second.point, Some(ids[2]));
//! assert_eq!(neighbours.len(), 2);
//! assert_eq!(neighbours[0].point, Some(ids[1]));
//! ```

#[cfg(feature = "tracing")]
use tracing::{event, Level};

use crate::accept::{Accept, AcceptAll, AcceptExcept};
use crate::error::Result;
use crate::nearest_neighbour::NearestNeighbour;
use crate::norm_bijection::{Euclidean, NormBijection};
use crate::point_kdtree::PointKdTree;
use crate::ranked_set::RankedSet;
use crate::search_algorithm::{DepthFirst, SearchAlgorithm};
use crate::search_nearest_algorithm::{search_nearest_algorithm, QueryConfig, SearchStats};
use crate::types::{Axis, PointId};

/// Receives the matches of a search, nearest first.
///
/// Implemented for every `FnMut(NearestNeighbour<A>)`.
pub trait Report<A> {
    /// Called once per match.
    fn report(&mut self, neighbour: NearestNeighbour<A>);
}

impl<A, F: FnMut(NearestNeighbour<A>)> Report<A> for F {
    #[inline]
    fn report(&mut self, neighbour: NearestNeighbour<A>) {
        self(neighbour)
    }
}

/// Discards every match.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Discard;

impl<A> Report<A> for Discard {
    #[inline]
    fn report(&mut self, _neighbour: NearestNeighbour<A>) {}
}

/// Builder of a k-nearest-neighbour search. Created by
/// [`PointKdTree::search_nearest`].
pub struct SearchNearest<
    't,
    A: Axis,
    const K: usize,
    N = Euclidean,
    S = DepthFirst,
    P = AcceptAll,
    R = Discard,
> {
    tree: &'t PointKdTree<A, K>,
    query: [A; K],
    config: QueryConfig<A, N, S, P>,
    report: R,
    k_nearest: usize,
    report_missing: bool,
    sort_distances: bool,
}

impl<'t, A: Axis, const K: usize> SearchNearest<'t, A, K> {
    pub(crate) fn new(tree: &'t PointKdTree<A, K>, query: [A; K]) -> Self {
        SearchNearest {
            tree,
            query,
            config: QueryConfig::new(),
            report: Discard,
            k_nearest: 1,
            report_missing: false,
            sort_distances: true,
        }
    }
}

impl<'t, A: Axis, const K: usize, N, S, P, R> SearchNearest<'t, A, K, N, S, P, R> {
    /// Only points for which `accept` returns true are reported.
    /// Default: every point.
    pub fn accept<P2: Accept>(self, accept: P2) -> SearchNearest<'t, A, K, N, S, P2, R> {
        SearchNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_accept(accept),
            report: self.report,
            k_nearest: self.k_nearest,
            report_missing: self.report_missing,
            sort_distances: self.sort_distances,
        }
    }

    /// Receives the up to `k_nearest` matches, nearest first unless
    /// [`SearchNearest::sort_distances`] is turned off. Closures need their
    /// argument type spelled out. Default: matches are discarded.
    pub fn report<R2: Report<A>>(
        self,
        report: R2,
    ) -> SearchNearest<'t, A, K, N, S, P, R2> {
        SearchNearest {
            tree: self.tree,
            query: self.query,
            config: self.config,
            report,
            k_nearest: self.k_nearest,
            report_missing: self.report_missing,
            sort_distances: self.sort_distances,
        }
    }

    /// The norm distances are measured in. Default: [`Euclidean`].
    pub fn norm_bijection<N2: NormBijection<A>>(
        self,
        norm_bijection: N2,
    ) -> SearchNearest<'t, A, K, N2, S, P, R> {
        SearchNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_norm_bijection(norm_bijection),
            report: self.report,
            k_nearest: self.k_nearest,
            report_missing: self.report_missing,
            sort_distances: self.sort_distances,
        }
    }

    /// The order nodes are visited in. Default: [`DepthFirst`].
    pub fn search_algorithm<S2>(
        self,
        search_algorithm: S2,
    ) -> SearchNearest<'t, A, K, N, S2, P, R> {
        SearchNearest {
            tree: self.tree,
            query: self.query,
            config: self.config.with_search_algorithm(search_algorithm),
            report: self.report,
            k_nearest: self.k_nearest,
            report_missing: self.report_missing,
            sort_distances: self.sort_distances,
        }
    }

    /// Only points at a bijected distance strictly below `max_distance` are
    /// reported. Default: `+inf`.
    pub fn max_distance(mut self, max_distance: A) -> Self {
        self.config.max_distance = max_distance;
        self
    }

    /// Allows reported points to be up to `1 + max_relative_error` times
    /// farther (in the norm) than the true neighbours. Default: 0, exact.
    pub fn max_relative_error(mut self, max_relative_error: A) -> Self {
        self.config.max_relative_error = max_relative_error;
        self
    }

    /// Subtrees with at most this many points in the time window are scanned
    /// directly. Default: 16.
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.config.bucket_size = bucket_size;
        self
    }

    /// Number of neighbours to find. Default: 1.
    pub fn k_nearest(mut self, k_nearest: usize) -> Self {
        self.k_nearest = k_nearest;
        self
    }

    /// If set, unfilled neighbour slots are reported as
    /// [`NearestNeighbour::not_found`]. Default: false.
    pub fn report_missing(mut self, report_missing: bool) -> Self {
        self.report_missing = report_missing;
        self
    }

    /// If cleared, matches are reported in no particular order, which saves
    /// sorting them. Default: true.
    pub fn sort_distances(mut self, sort_distances: bool) -> Self {
        self.sort_distances = sort_distances;
        self
    }

    /// Restricts the search to points inserted within the given stamp
    /// intervals: flattened `[begin, end)` pairs, non-decreasing. An odd
    /// number of stamps leaves the last interval open-ended.
    /// Default: every point.
    pub fn time_intervals(mut self, stamps: &[usize]) -> Self {
        self.config.time_intervals = Some(stamps.to_vec());
        self
    }
}

impl<'t, A, const K: usize, N, S, P, R> SearchNearest<'t, A, K, N, S, P, R>
where
    A: Axis,
    N: NormBijection<A>,
    S: SearchAlgorithm<'t, A, K>,
    P: Accept,
    R: Report<A>,
{
    /// Runs the search and returns the k-th nearest neighbour, or
    /// [`NearestNeighbour::not_found`] if fewer than `k_nearest` points
    /// matched.
    pub fn run(self) -> Result<NearestNeighbour<A>> {
        self.run_with_stats().map(|(neighbour, _)| neighbour)
    }

    /// As [`SearchNearest::run`], also returning traversal counters.
    pub fn run_with_stats(self) -> Result<(NearestNeighbour<A>, SearchStats)> {
        self.config.validate()?;
        let SearchNearest {
            tree,
            query,
            config,
            mut report,
            k_nearest,
            report_missing,
            sort_distances,
        } = self;

        if k_nearest == 0 {
            return Ok((NearestNeighbour::not_found(), SearchStats::default()));
        }

        // no more than the visible points can ever match
        let mut candidates = RankedSet::new(k_nearest.min(tree.points()));
        let stats = search_nearest_algorithm(tree, &query, &config, |distance, point| {
            candidates.push(NearestNeighbour {
                distance,
                point: Some(point),
            });
            match candidates.top() {
                Some(worst) if candidates.is_full() => worst.distance,
                _ => A::infinity(),
            }
        });

        let result = match candidates.top() {
            Some(worst) if candidates.len() == k_nearest => *worst,
            _ => NearestNeighbour::not_found(),
        };
        let found = candidates.release(sort_distances);

        #[cfg(feature = "tracing")]
        event!(
            Level::TRACE,
            k_nearest,
            found = found.len(),
            nodes_visited = stats.nodes_visited,
            "search_nearest finished"
        );

        let missing = k_nearest - found.len();
        for neighbour in found {
            report.report(neighbour);
        }
        if report_missing {
            for _ in 0..missing {
                report.report(NearestNeighbour::not_found());
            }
        }

        Ok((result, stats))
    }
}

impl<A: Axis, const K: usize> PointKdTree<A, K> {
    /// Starts building a nearest-neighbour search around `query`.
    pub fn search_nearest(&self, query: &[A; K]) -> SearchNearest<'_, A, K> {
        SearchNearest::new(self, *query)
    }

    /// Starts building a nearest-neighbour search around a stored point. The
    /// point itself is a candidate unless excluded with
    /// [`AcceptExcept`].
    pub fn search_nearest_from(&self, point: PointId) -> Result<SearchNearest<'_, A, K>> {
        let query = self.record(point)?.point;
        Ok(SearchNearest::new(self, query))
    }

    /// Finds the `k_nearest` neighbours of every visible point, excluding the
    /// point itself. Rows follow insertion order, each nearest first.
    pub fn search_all_nearest<'t, N, S>(
        &'t self,
        k_nearest: usize,
        norm_bijection: N,
        search_algorithm: S,
    ) -> Result<Vec<(PointId, Vec<NearestNeighbour<A>>)>>
    where
        N: NormBijection<A> + Clone,
        S: SearchAlgorithm<'t, A, K> + Clone,
    {
        let mut rows = Vec::with_capacity(self.points());
        for point in self.point_ids() {
            if self.is_hidden(point) != Some(false) {
                continue;
            }
            let mut row = Vec::with_capacity(k_nearest.min(self.points()));
            self.search_nearest_from(point)?
                .norm_bijection(norm_bijection.clone())
                .search_algorithm(search_algorithm.clone())
                .accept(AcceptExcept(point))
                .k_nearest(k_nearest)
                .report(|neighbour: NearestNeighbour<A>| row.push(neighbour))
                .run()?;
            rows.push((point, row));
        }
        Ok(rows)
    }
}
