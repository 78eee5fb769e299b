//! Error types for tree maintenance and queries.

use crate::types::{NodeId, PointId};
use std::fmt;

/// Precondition violations reported by tree operations and query builders.
///
/// None of these leave the tree modified: every operation validates its
/// arguments before touching any node or point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The point handle does not name a point currently stored in the tree.
    UnknownPoint(PointId),
    /// The node handle does not name a node currently in the tree.
    UnknownNode(NodeId),
    /// `max_distance` was negative.
    NegativeMaxDistance,
    /// `max_relative_error` was negative.
    NegativeRelativeError,
    /// A bucket size of zero was given to `refine`.
    ZeroBucketSize,
    /// A query parameter was NaN.
    NotANumber(&'static str),
    /// Minkowski norms need a power of at least one.
    InvalidPower,
    /// Time-interval stamps must be non-decreasing.
    UnorderedTimeIntervals,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownPoint(id) => write!(f, "Point {} is not stored in this tree", id.0),
            Error::UnknownNode(id) => write!(f, "Node {} is not part of this tree", id.0),
            Error::NegativeMaxDistance => write!(f, "max_distance must be non-negative"),
            Error::NegativeRelativeError => write!(f, "max_relative_error must be non-negative"),
            Error::ZeroBucketSize => write!(f, "bucket_size must be at least one"),
            Error::NotANumber(what) => write!(f, "{what} must not be NaN"),
            Error::InvalidPower => write!(f, "Minkowski power must be at least one"),
            Error::UnorderedTimeIntervals => {
                write!(f, "Time-interval stamps must be non-decreasing")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
