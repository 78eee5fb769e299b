//! Split rules used by [`PointKdTree::refine`](crate::PointKdTree::refine) to
//! choose the splitting plane of an overfull leaf.
//!
//! A rule returns `(position, axis)`. Points with `point[axis] < position` go to
//! the left child, the rest to the right child. Every rule here guarantees that
//! both sides receive at least one of the given points, or declines to split.
use crate::bound::AlignedBox;
use crate::types::Axis;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chooses a splitting plane for a set of points inside a region.
pub trait SplitRule<A: Axis, const K: usize> {
    /// `points` are the visible points of the leaf being split and `region`
    /// is the cell of the leaf. Returns `None` if the points cannot be
    /// separated.
    fn split(&self, points: &[[A; K]], region: &AlignedBox<A, K>) -> Option<(A, usize)>;
}

/// Splits the longest side of the cell at its midpoint, sliding the plane onto
/// the nearest point when one side would otherwise be empty.
///
/// # Examples
///
/// ```rust
/// use pointkd::bound::AlignedBox;
/// use pointkd::split_rule::{SlidingMidpoint, SplitRule};
///
/// let region = AlignedBox::new([0f64, 0f64], [10f64, 1f64]);
///
/// let straddling = [[1f64, 0f64], [2f64, 0f64], [9f64, 0f64]];
/// assert_eq!(SlidingMidpoint.split(&straddling, &region), Some((5f64, 0)));
///
/// // nothing right of the midpoint: the plane slides left onto the last point
/// let clustered = [[1f64, 0f64], [2f64, 0f64], [3f64, 0f64]];
/// assert_eq!(SlidingMidpoint.split(&clustered, &region), Some((3f64, 0)));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SlidingMidpoint;

impl<A: Axis, const K: usize> SplitRule<A, K> for SlidingMidpoint {
    fn split(&self, points: &[[A; K]], region: &AlignedBox<A, K>) -> Option<(A, usize)> {
        let spread = AlignedBox::covering(points.iter());
        if spread.is_empty() {
            return None;
        }

        let mut axis = region.longest_axis();
        if spread.extent(axis) <= A::zero() {
            axis = spread.longest_axis();
        }
        if spread.extent(axis) <= A::zero() {
            return None;
        }

        let half = A::from_f64(0.5);
        let mut position = if region.extent(axis) > A::zero() && region.extent(axis).is_finite() {
            (region.min[axis] + region.max[axis]) * half
        } else {
            (spread.min[axis] + spread.max[axis]) * half
        };

        if position <= spread.min[axis] {
            position = next_above(points, axis, spread.min[axis])?;
        } else if position > spread.max[axis] {
            position = spread.max[axis];
        }

        Some((position, axis))
    }
}

/// Splits the longest side of the points' bounding box at its midpoint.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Midpoint;

impl<A: Axis, const K: usize> SplitRule<A, K> for Midpoint {
    fn split(&self, points: &[[A; K]], _region: &AlignedBox<A, K>) -> Option<(A, usize)> {
        let spread = AlignedBox::covering(points.iter());
        let axis = spread.longest_axis();
        if spread.is_empty() || spread.extent(axis) <= A::zero() {
            return None;
        }

        let mut position = (spread.min[axis] + spread.max[axis]) * A::from_f64(0.5);
        if position <= spread.min[axis] {
            position = spread.max[axis];
        }

        Some((position, axis))
    }
}

/// Splits the longest side of the points' bounding box at the median
/// coordinate, giving balanced subtrees.
///
/// # Examples
///
/// ```rust
/// use pointkd::bound::AlignedBox;
/// use pointkd::split_rule::{LongestMedian, SplitRule};
///
/// let points = [[0f64], [1f64], [2f64], [50f64], [100f64]];
/// let region = AlignedBox::new([0f64], [100f64]);
/// assert_eq!(LongestMedian.split(&points, &region), Some((2f64, 0)));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LongestMedian;

impl<A: Axis, const K: usize> SplitRule<A, K> for LongestMedian {
    fn split(&self, points: &[[A; K]], _region: &AlignedBox<A, K>) -> Option<(A, usize)> {
        let spread = AlignedBox::covering(points.iter());
        let axis = spread.longest_axis();
        if spread.is_empty() || spread.extent(axis) <= A::zero() {
            return None;
        }

        let mut values: Vec<A> = points.iter().map(|point| point[axis]).collect();
        let middle = values.len() / 2;
        let (_, median, _) = values
            .select_nth_unstable_by(middle, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mut position = *median;

        if position <= spread.min[axis] {
            position = next_above(points, axis, spread.min[axis])?;
        }

        Some((position, axis))
    }
}

/// Smallest coordinate along `axis` strictly greater than `value`.
fn next_above<A: Axis, const K: usize>(points: &[[A; K]], axis: usize, value: A) -> Option<A> {
    points
        .iter()
        .map(|point| point[axis])
        .filter(|&x| x > value)
        .fold(None, |best: Option<A>, x| match best {
            Some(b) if b <= x => Some(b),
            _ => Some(x),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rstest::rstest;

    fn assert_separates<const K: usize>(points: &[[f64; K]], split: Option<(f64, usize)>) {
        let (position, axis) = split.expect("expected a split");
        let left = points.iter().filter(|p| p[axis] < position).count();
        assert!(left > 0, "left side empty");
        assert!(left < points.len(), "right side empty");
    }

    fn random_points(n: usize) -> Vec<[f64; 3]> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| std::array::from_fn(|_| rng.random_range(-100f64..100f64)))
            .collect()
    }

    #[rstest]
    #[case(2)]
    #[case(17)]
    #[case(500)]
    fn every_rule_separates_random_points(#[case] n: usize) {
        let points = random_points(n);
        let region = AlignedBox::new([-100f64; 3], [100f64; 3]);
        assert_separates(&points, SlidingMidpoint.split(&points, &region));
        assert_separates(&points, Midpoint.split(&points, &region));
        assert_separates(&points, LongestMedian.split(&points, &region));
    }

    #[test]
    fn sliding_midpoint_slides_onto_points() {
        let region = AlignedBox::new([0f64, 0f64], [10f64, 1f64]);

        let clustered_left = [[1f64, 0f64], [2f64, 0f64], [3f64, 0f64]];
        assert_eq!(
            SlidingMidpoint.split(&clustered_left, &region),
            Some((3f64, 0))
        );

        let clustered_right = [[7f64, 0f64], [8f64, 0f64], [9f64, 0f64]];
        assert_eq!(
            SlidingMidpoint.split(&clustered_right, &region),
            Some((8f64, 0))
        );

        let straddling = [[1f64, 0f64], [9f64, 0f64]];
        assert_eq!(SlidingMidpoint.split(&straddling, &region), Some((5f64, 0)));
    }

    #[test]
    fn sliding_midpoint_falls_back_to_spread_axis() {
        let region = AlignedBox::new([0f64, 0f64], [10f64, 1f64]);
        let points = [[4f64, 0.25f64], [4f64, 0.75f64]];
        assert_eq!(SlidingMidpoint.split(&points, &region), Some((0.5f64, 1)));
    }

    #[test]
    fn coincident_points_are_not_split() {
        let region = AlignedBox::new([0f64, 0f64], [1f64, 1f64]);
        let points = [[0.5f64, 0.5f64]; 40];
        assert_eq!(SlidingMidpoint.split(&points, &region), None);
        assert_eq!(Midpoint.split(&points, &region), None);
        assert_eq!(LongestMedian.split(&points, &region), None);
    }

    #[test]
    fn median_moves_off_duplicated_minimum() {
        let points = [[0f64], [0f64], [0f64], [0f64], [3f64]];
        let region = AlignedBox::new([0f64], [3f64]);
        assert_eq!(LongestMedian.split(&points, &region), Some((3f64, 0)));
    }
}
