//! Definitions of the numeric and handle types shared by the tree and its queries
use az::{Az, Cast};
use num_traits::float::FloatCore;
use num_traits::Float;
use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis trait represents the traits that must be implemented
/// by the type that is used as the first generic parameter, `A`,
/// on [`PointKdTree`](crate::PointKdTree). This will be [`f64`] or [`f32`].
pub trait Axis: FloatCore + Default + Debug + Copy + Sync + Send + std::ops::AddAssign {
    /// square root, needed to map squared euclidean distances back to the norm
    fn sqrt(self) -> Self;

    /// raises `self` to a floating point power, used by the Minkowski norm
    fn powf(self, n: Self) -> Self;

    /// converts an `f64` constant (such as a protective factor) into this type
    fn from_f64(value: f64) -> Self;
}

impl<T> Axis for T
where
    T: FloatCore + Float + Default + Debug + Sync + Send + std::ops::AddAssign,
    f64: Cast<T>,
{
    #[inline]
    fn sqrt(self) -> Self {
        Float::sqrt(self)
    }

    #[inline]
    fn powf(self, n: Self) -> Self {
        Float::powf(self, n)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value.az::<T>()
    }
}

/// Stable handle of a point stored in a [`PointKdTree`](crate::PointKdTree).
///
/// Handles are handed out in insertion order, so a handle also serves as the
/// insertion timestamp of its point. Time-windowed queries are expressed in
/// terms of these stamps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub(crate) usize);

impl PointId {
    /// The insertion stamp of this point.
    pub fn stamp(self) -> usize {
        self.0
    }
}

/// Handle of a node of a [`PointKdTree`](crate::PointKdTree).
///
/// Node handles stay valid until the next `refine`, `merge` or `clear`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);
