#![warn(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]

//! # PointKd
//!
//! Approximate k-nearest-neighbour search over an adaptive point k-d tree.
//!
//! Points are inserted into a [`PointKdTree`] and the tree is subdivided with
//! [`PointKdTree::refine`]. Every node tracks the tight interval of its points
//! along its parent's split axis, which lets queries bound distances closely
//! and skip empty space. Points can be hidden, shown and erased without
//! rebuilding the tree, and queries can be restricted to points inserted within
//! given time windows.
//!
//! Queries are configured through builders:
//! * [`PointKdTree::search_nearest`] finds the k nearest neighbours of a point,
//!   optionally within a maximum distance and up to a relative error.
//! * [`PointKdTree::count_nearest`] counts the points inside an open ball.
//!
//! Norms are plugged in through [`NormBijection`](norm_bijection::NormBijection),
//! traversal orders through
//! [`SearchAlgorithm`](search_algorithm::SearchAlgorithm), and the shape of the
//! tree through [`SplitRule`](split_rule::SplitRule).
//!
//! Distances given to and returned by queries are *bijected*: for the default
//! Euclidean norm they are squared distances.
//!
//! ## Installation
//!
//! Add `pointkd` to `Cargo.toml`
//! ```toml
//! [dependencies]
//! pointkd = "0.1.0"
//! ```
//!
//! ## Usage
//! ```rust
//! use pointkd::{NearestNeighbour, PointKdTree};
//! use pointkd::split_rule::SlidingMidpoint;
//!
//! let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
//! let a = tree.insert([0f64, 0f64]);
//! let b = tree.insert([1f64, 1f64]);
//! let c = tree.insert([2f64, 2f64]);
//! tree.insert([3f64, 3f64]);
//! tree.refine(&SlidingMidpoint, 2).unwrap();
//!
//! assert_eq!(tree.points(), 4);
//!
//! let mut nearest = Vec::new();
//! tree.search_nearest(&[0f64, 0f64])
//!     .k_nearest(3)
//!     .report(|n: NearestNeighbour<f64>| nearest.push((n.distance, n.point)))
//!     .run()
//!     .unwrap();
//! assert_eq!(nearest, vec![(0f64, Some(a)), (2f64, Some(b)), (8f64, Some(c))]);
//!
//! let within = tree.count_nearest(&[0f64, 0f64]).max_distance(8f64).run().unwrap();
//! assert_eq!(within, 2);
//! ```
//!
//! ## Optional features
//!
//! * `tracing` (default): emits `tracing` spans and events from `refine` and
//!   from queries.
//! * `serde`: `Serialize`/`Deserialize` for handles, results, norms, split
//!   rules and traversal strategies.

pub mod accept;
pub mod bound;
pub mod count_nearest;
mod error;
pub mod nearest_neighbour;
pub mod norm_bijection;
pub mod point_kdtree;
pub mod ranked_set;
pub mod search_algorithm;
pub mod search_nearest;
pub mod search_nearest_algorithm;
pub mod split_rule;
#[cfg(feature = "test_utils")]
#[doc(hidden)]
pub mod test_utils;
pub mod types;

pub use crate::error::{Error, Result};
pub use crate::nearest_neighbour::NearestNeighbour;
pub use crate::point_kdtree::PointKdTree;
pub use crate::types::{Axis, NodeId, PointId};
