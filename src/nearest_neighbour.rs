//! A result item returned by a query
use crate::types::PointId;
use num_traits::float::FloatCore;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents an entry in the results of a nearest neighbour query, with `distance` being the
/// bijected distance of this particular point from the query point, and `point` being the handle
/// of the point that was found. A `point` of `None` marks a "not found" entry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone)]
pub struct NearestNeighbour<A> {
    /// the bijected distance of the found point from the query point
    pub distance: A,
    /// the handle of the point that was found
    pub point: Option<PointId>,
}

impl<A: FloatCore> NearestNeighbour<A> {
    /// The "not found" sentinel: infinite distance and no point.
    pub fn not_found() -> Self {
        NearestNeighbour {
            distance: A::infinity(),
            point: None,
        }
    }
}

impl<A> NearestNeighbour<A> {
    /// Returns true unless this is a "not found" entry.
    pub fn is_found(&self) -> bool {
        self.point.is_some()
    }
}

impl<A: PartialOrd> Ord for NearestNeighbour<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

#[allow(unknown_lints)]
#[allow(clippy::non_canonical_partial_ord_impl)]
impl<A: PartialOrd> PartialOrd for NearestNeighbour<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.distance.partial_cmp(&other.distance)
    }
}

impl<A: PartialEq> Eq for NearestNeighbour<A> {}

impl<A: PartialEq> PartialEq for NearestNeighbour<A> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.point == other.point
    }
}

impl<A> From<NearestNeighbour<A>> for (A, Option<PointId>) {
    fn from(elem: NearestNeighbour<A>) -> Self {
        (elem.distance, elem.point)
    }
}
