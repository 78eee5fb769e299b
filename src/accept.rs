//! Predicates deciding which points a query may return.
use crate::types::PointId;

/// Decides whether a candidate point may be reported by a query.
///
/// Implemented for every `Fn(PointId) -> bool`, so a closure can be passed
/// directly.
pub trait Accept {
    /// Returns true if `point` may be reported.
    fn accept(&self, point: PointId) -> bool;
}

impl<F: Fn(PointId) -> bool> Accept for F {
    #[inline]
    fn accept(&self, point: PointId) -> bool {
        self(point)
    }
}

/// Accepts every point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl Accept for AcceptAll {
    #[inline]
    fn accept(&self, _point: PointId) -> bool {
        true
    }
}

/// Accepts every point except one, typically the query point itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AcceptExcept(pub PointId);

impl Accept for AcceptExcept {
    #[inline]
    fn accept(&self, point: PointId) -> bool {
        point != self.0
    }
}
