//! Axis-aligned bounding boxes and point-to-interval distances
use crate::norm_bijection::NormBijection;
use crate::types::Axis;

/// An axis-aligned box. A box is empty when `min > max` on some axis;
/// [`AlignedBox::empty`] uses `+inf`/`-inf` so that extending it by any point
/// yields that point's degenerate box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlignedBox<A, const K: usize> {
    /// lower corner
    pub min: [A; K],
    /// upper corner
    pub max: [A; K],
}

impl<A: Axis, const K: usize> AlignedBox<A, K> {
    /// Creates a box from its two corners.
    pub fn new(min: [A; K], max: [A; K]) -> Self {
        AlignedBox { min, max }
    }

    /// The empty box.
    pub fn empty() -> Self {
        AlignedBox {
            min: [A::infinity(); K],
            max: [A::neg_infinity(); K],
        }
    }

    /// The smallest box covering all of `points`.
    pub fn covering<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a [A; K]>,
        A: 'a,
    {
        let mut bound = Self::empty();
        for point in points {
            bound.extend(point);
        }
        bound
    }

    /// Returns true if the box contains no point.
    pub fn is_empty(&self) -> bool {
        (0..K).any(|dim| self.min[dim] > self.max[dim])
    }

    /// Grows the box so that it covers `point`.
    pub fn extend(&mut self, point: &[A; K]) {
        for dim in 0..K {
            if point[dim] < self.min[dim] {
                self.min[dim] = point[dim];
            }
            if point[dim] > self.max[dim] {
                self.max[dim] = point[dim];
            }
        }
    }

    /// Returns true if `point` lies inside the closed box.
    pub fn contains(&self, point: &[A; K]) -> bool {
        (0..K).all(|dim| self.min[dim] <= point[dim] && point[dim] <= self.max[dim])
    }

    /// Width of the box along `dim`. Zero for an empty box.
    pub fn extent(&self, dim: usize) -> A {
        if self.min[dim] > self.max[dim] {
            A::zero()
        } else {
            self.max[dim] - self.min[dim]
        }
    }

    /// The axis along which the box is widest (the first one on ties).
    pub fn longest_axis(&self) -> usize {
        let mut axis = 0;
        for dim in 1..K {
            if self.extent(dim) > self.extent(axis) {
                axis = dim;
            }
        }
        axis
    }

    /// Bijected distance from `point` to the closest point of the box.
    /// `+inf` for an empty box.
    pub fn distance<N: NormBijection<A>>(&self, norm: &N, point: &[A; K]) -> A {
        let mut distance = A::zero();
        for dim in 0..K {
            let axis_distance = interval_distance(point[dim], self.min[dim], self.max[dim]);
            distance = norm.add_axis(distance, norm.axis(axis_distance));
        }
        distance
    }
}

/// Distance from `x` to the closed interval `[min, max]`: zero inside it,
/// `+inf` when the interval is empty.
#[inline]
pub(crate) fn interval_distance<A: Axis>(x: A, min: A, max: A) -> A {
    if min > max {
        A::infinity()
    } else if x < min {
        min - x
    } else if x > max {
        x - max
    } else {
        A::zero()
    }
}
