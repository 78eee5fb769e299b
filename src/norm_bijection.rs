//! Norm bijections: monotone rescalings of a norm into a form that is cheap
//! to accumulate one axis at a time.
//!
//! Every distance that flows through the search engine is *bijected*. For the
//! Euclidean norm that means squared, so that a point-to-point distance is a plain
//! sum of per-axis terms and never needs a square root. Conversions to and from
//! the real norm only happen at the boundaries of a query.

use crate::error::{Error, Result};
use crate::types::Axis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait that needs to be implemented by any norm used within queries.
///
/// The norm must be decomposable per coordinate axis: the bijected distance
/// between two points is `add_axis` folded over the bijected per-axis
/// distances, starting from zero.
pub trait NormBijection<A: Axis> {
    /// maps a bijected distance back to the norm
    fn to_norm(&self, bijected: A) -> A;

    /// maps a norm distance into the bijected domain
    fn to_bijection(&self, norm: A) -> A;

    /// maps a multiplicative scaling of the norm (such as `1 + ε`) into the
    /// multiplicative scaling of the bijected distance
    fn scaling_factor(&self, scaling: A) -> A;

    /// bijects a non-negative distance along a single axis
    fn axis(&self, axis_distance: A) -> A;

    /// bijects a signed difference along a single axis
    #[inline]
    fn signed_axis(&self, signed_axis_distance: A) -> A {
        self.axis(signed_axis_distance.abs())
    }

    /// folds a fresh per-axis contribution into a bijected distance
    fn add_axis(&self, distance: A, new_axis_distance: A) -> A;

    /// replaces a per-axis contribution that was previously folded into `distance`
    fn replace_axis(&self, distance: A, old_axis_distance: A, new_axis_distance: A) -> A;

    /// returns the bijected distance between two points
    #[inline]
    fn distance<const K: usize>(&self, a: &[A; K], b: &[A; K]) -> A {
        self.distance_with_cutoff(a, b, A::infinity())
    }

    /// returns the bijected distance between two points, abandoning the
    /// accumulation as soon as it reaches `cutoff`. Any returned value `>= cutoff`
    /// is then only known to be at least `cutoff`.
    #[inline]
    fn distance_with_cutoff<const K: usize>(&self, a: &[A; K], b: &[A; K], cutoff: A) -> A {
        let mut distance = A::zero();
        for dim in 0..K {
            distance = self.add_axis(distance, self.signed_axis(b[dim] - a[dim]));
            if distance >= cutoff {
                break;
            }
        }
        distance
    }
}

/// The Euclidean norm, bijected to the squared Euclidean distance.
///
/// # Examples
///
/// ```rust
/// use pointkd::norm_bijection::{Euclidean, NormBijection};
///
/// assert_eq!(0f64, Euclidean.distance(&[0f64, 0f64], &[0f64, 0f64]));
/// assert_eq!(1f64, Euclidean.distance(&[0f64, 0f64], &[1f64, 0f64]));
/// assert_eq!(25f64, Euclidean.distance(&[0f64, 0f64], &[3f64, 4f64]));
/// assert_eq!(5f64, Euclidean.to_norm(25f64));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Euclidean;

impl<A: Axis> NormBijection<A> for Euclidean {
    #[inline]
    fn to_norm(&self, bijected: A) -> A {
        bijected.sqrt()
    }

    #[inline]
    fn to_bijection(&self, norm: A) -> A {
        norm * norm
    }

    #[inline]
    fn scaling_factor(&self, scaling: A) -> A {
        scaling * scaling
    }

    #[inline]
    fn axis(&self, axis_distance: A) -> A {
        axis_distance * axis_distance
    }

    #[inline]
    fn signed_axis(&self, signed_axis_distance: A) -> A {
        signed_axis_distance * signed_axis_distance
    }

    #[inline]
    fn add_axis(&self, distance: A, new_axis_distance: A) -> A {
        distance + new_axis_distance
    }

    #[inline]
    fn replace_axis(&self, distance: A, old_axis_distance: A, new_axis_distance: A) -> A {
        (distance - old_axis_distance) + new_axis_distance
    }
}

/// The Manhattan / "taxi cab" norm. It is its own bijection.
///
/// # Examples
///
/// ```rust
/// use pointkd::norm_bijection::{Manhattan, NormBijection};
///
/// assert_eq!(0f32, Manhattan.distance(&[0f32, 0f32], &[0f32, 0f32]));
/// assert_eq!(2f32, Manhattan.distance(&[0f32, 0f32], &[1f32, -1f32]));
/// assert_eq!(7f32, Manhattan.distance(&[0f32, 0f32], &[3f32, 4f32]));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Manhattan;

impl<A: Axis> NormBijection<A> for Manhattan {
    #[inline]
    fn to_norm(&self, bijected: A) -> A {
        bijected
    }

    #[inline]
    fn to_bijection(&self, norm: A) -> A {
        norm
    }

    #[inline]
    fn scaling_factor(&self, scaling: A) -> A {
        scaling
    }

    #[inline]
    fn axis(&self, axis_distance: A) -> A {
        axis_distance
    }

    #[inline]
    fn add_axis(&self, distance: A, new_axis_distance: A) -> A {
        distance + new_axis_distance
    }

    #[inline]
    fn replace_axis(&self, distance: A, old_axis_distance: A, new_axis_distance: A) -> A {
        (distance - old_axis_distance) + new_axis_distance
    }
}

/// The maximum (Chebyshev) norm. Per-axis contributions fold with `max`.
///
/// A contribution folded with `max` cannot be retracted, so `replace_axis`
/// returns `max(distance, new)`. Within a tree every child interval lies inside
/// the interval its parent was measured against, so the new contribution never
/// undercuts the old one and the result remains a valid lower bound.
///
/// # Examples
///
/// ```rust
/// use pointkd::norm_bijection::{Maximum, NormBijection};
///
/// assert_eq!(4f64, Maximum.distance(&[0f64, 0f64], &[3f64, -4f64]));
/// assert_eq!(3f64, Maximum.replace_axis(3f64, 1f64, 2f64));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Maximum;

impl<A: Axis> NormBijection<A> for Maximum {
    #[inline]
    fn to_norm(&self, bijected: A) -> A {
        bijected
    }

    #[inline]
    fn to_bijection(&self, norm: A) -> A {
        norm
    }

    #[inline]
    fn scaling_factor(&self, scaling: A) -> A {
        scaling.abs()
    }

    #[inline]
    fn axis(&self, axis_distance: A) -> A {
        axis_distance
    }

    #[inline]
    fn add_axis(&self, distance: A, new_axis_distance: A) -> A {
        distance.max(new_axis_distance)
    }

    #[inline]
    fn replace_axis(&self, distance: A, _old_axis_distance: A, new_axis_distance: A) -> A {
        distance.max(new_axis_distance)
    }
}

/// The Minkowski p-norm for `p >= 1`, bijected by raising to the power `p`.
///
/// # Examples
///
/// ```rust
/// use pointkd::norm_bijection::{Minkowski, NormBijection};
///
/// let norm = Minkowski::new(3f64).unwrap();
/// assert_eq!(35f64, norm.distance(&[0f64, 0f64], &[2f64, 3f64]));
/// assert!((norm.to_norm(8f64) - 2f64).abs() < 1e-12);
/// assert!(Minkowski::new(0.5f64).is_err());
/// ```
///
/// Only the power is serialized. Deserializing goes through
/// [`Minkowski::new`], so invalid powers are rejected.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "MinkowskiPower<A>",
        bound(deserialize = "A: Axis + Deserialize<'de>")
    )
)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Minkowski<A> {
    power: A,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    inverted_power: A,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct MinkowskiPower<A> {
    power: A,
}

#[cfg(feature = "serde")]
impl<A: Axis> TryFrom<MinkowskiPower<A>> for Minkowski<A> {
    type Error = Error;

    fn try_from(raw: MinkowskiPower<A>) -> Result<Self> {
        Minkowski::new(raw.power)
    }
}

impl<A: Axis> Minkowski<A> {
    /// Creates a Minkowski norm of the given power.
    pub fn new(power: A) -> Result<Self> {
        if power.is_nan() {
            return Err(Error::NotANumber("power"));
        }
        if power < A::one() {
            return Err(Error::InvalidPower);
        }
        Ok(Minkowski {
            power,
            inverted_power: A::one() / power,
        })
    }

    /// The power `p` of this norm.
    pub fn power(&self) -> A {
        self.power
    }
}

impl<A: Axis> NormBijection<A> for Minkowski<A> {
    #[inline]
    fn to_norm(&self, bijected: A) -> A {
        bijected.powf(self.inverted_power)
    }

    #[inline]
    fn to_bijection(&self, norm: A) -> A {
        norm.powf(self.power)
    }

    #[inline]
    fn scaling_factor(&self, scaling: A) -> A {
        scaling.abs().powf(self.power)
    }

    #[inline]
    fn axis(&self, axis_distance: A) -> A {
        axis_distance.powf(self.power)
    }

    #[inline]
    fn add_axis(&self, distance: A, new_axis_distance: A) -> A {
        distance + new_axis_distance
    }

    #[inline]
    fn replace_axis(&self, distance: A, old_axis_distance: A, new_axis_distance: A) -> A {
        (distance - old_axis_distance) + new_axis_distance
    }
}
