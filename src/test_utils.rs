//! Helpers for tests and benchmarks: random point sets and a linear-scan
//! reference search.
use std::array;

use rand::Rng;
use rand_distr::{Distribution, UnitCircle};

use crate::nearest_neighbour::NearestNeighbour;
use crate::norm_bijection::NormBijection;
use crate::point_kdtree::PointKdTree;
use crate::split_rule::SplitRule;
use crate::types::{Axis, PointId};

/// A point with every coordinate uniform in `[-1, 1)`.
pub fn rand_point<const K: usize>() -> [f64; K] {
    let mut rng = rand::rng();
    array::from_fn(|_| rng.random_range(-1f64..1f64))
}

/// `count` points with every coordinate uniform in `[-1, 1)`.
pub fn rand_points<const K: usize>(count: usize) -> Vec<[f64; K]> {
    (0..count).map(|_| rand_point::<K>()).collect()
}

/// `count` points spread uniformly over a circle of the given radius,
/// centred at the origin.
pub fn circle_points(count: usize, radius: f64) -> Vec<[f64; 2]> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let [x, y]: [f64; 2] = UnitCircle.sample(&mut rng);
            [x * radius, y * radius]
        })
        .collect()
}

/// Inserts `points` into a fresh tree and refines it.
///
/// # Panics
///
/// Panics if `bucket_size` is zero.
pub fn build_tree<R: SplitRule<f64, K>, const K: usize>(
    points: &[[f64; K]],
    split_rule: &R,
    bucket_size: usize,
) -> (PointKdTree<f64, K>, Vec<PointId>) {
    let mut tree = PointKdTree::with_capacity(points.len());
    let ids = tree.insert_set(points.iter().copied());
    tree.refine(split_rule, bucket_size)
        .expect("bucket size must be non-zero");
    (tree, ids)
}

/// The `k` visible, accepted points of `tree` nearest to `query` by a linear
/// scan, ascending, limited to bijected distances below `max_distance`.
pub fn linear_search<A, N, F, const K: usize>(
    tree: &PointKdTree<A, K>,
    norm: &N,
    query: &[A; K],
    k: usize,
    max_distance: A,
    accept: F,
) -> Vec<NearestNeighbour<A>>
where
    A: Axis,
    N: NormBijection<A>,
    F: Fn(PointId) -> bool,
{
    let mut found: Vec<NearestNeighbour<A>> = tree
        .point_ids()
        .filter(|&id| tree.is_hidden(id) == Some(false) && accept(id))
        .filter_map(|id| {
            let distance = norm.distance(query, tree.point(id)?);
            (distance < max_distance).then_some(NearestNeighbour {
                distance,
                point: Some(id),
            })
        })
        .collect();
    found.sort_by(|a, b| a.cmp(b));
    found.truncate(k);
    found
}

/// Installs a `tracing` subscriber writing to the test output. Safe to call
/// from several tests.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split_rule::SlidingMidpoint;

    #[test]
    fn build_tree_refines_the_points() {
        let points = rand_points::<2>(64);
        let (tree, ids) = build_tree(&points, &SlidingMidpoint, 4);
        assert_eq!(ids.len(), 64);
        assert_eq!(tree.points(), 64);
        assert!(!tree.root().leaf());
    }

    #[test]
    #[should_panic(expected = "bucket size must be non-zero")]
    fn build_tree_panics_on_zero_bucket_size() {
        build_tree(&rand_points::<2>(8), &SlidingMidpoint, 0);
    }
}
