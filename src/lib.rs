//! Bounding volume hierarchies for pairwise intersection and nearest-primitive queries
//! over fixed sets of primitives.
//!
//! ## About
//!
//! A hierarchy is built once over `N` caller-owned primitives and never copies their
//! geometry: it only keeps a permutation of primitive indices and one bounding volume
//! per node. Two construction strategies share one query contract, [`Hierarchy`]:
//!
//! - [`KeyTree`] sorts primitives by a scalar key, Morton codes of the box centers by
//!   default, and splits ranges where the key prefix changes.
//! - [`AxisTree`] splits ranges at the median along the axis of largest center spread.
//!   Its nodes can be sorted up front or lazily, the first time a query reaches them,
//!   and lazy sorting is safe from several threads at once.
//!
//! On top of that, [`traverse`] finds all intersecting pairs between two hierarchies
//! with a level-by-level traversal that runs serially, lazily or on the rayon pool, and
//! answers nearest-primitive queries with a branch-and-bound search.
//!
//! What "intersects" and "distance" mean is up to the caller: traversals take an
//! [`ExactTest`] and a [`DistanceFunctor`], which plain closures satisfy.
//!
//! ## Example
//!
//! ```
//! use pairwise_bvh::bvh::{AxisTree, CenterDivider, KeyTree};
//! use pairwise_bvh::shapes::Triangle;
//! use pairwise_bvh::traverse::{intersect, nearest_shape, Schedule};
//! use nalgebra::Point3;
//!
//! let strip = |z: f64| -> Vec<Triangle<f64>> {
//!     (0..100)
//!         .map(|i| {
//!             let x = i as f64;
//!             Triangle::new(
//!                 Point3::new(x, 0.0, z),
//!                 Point3::new(x + 1.0, 0.0, z),
//!                 Point3::new(x, 1.0, z),
//!             )
//!         })
//!         .collect()
//! };
//! let floor = strip(0.0);
//! let ceiling = strip(10.0);
//!
//! let a = KeyTree::from_shapes(&floor, 4).unwrap();
//! let b = AxisTree::lazy(CenterDivider::new(&ceiling), 4).unwrap();
//! let pairs = intersect(
//!     &a,
//!     &b,
//!     &|i: usize, j: usize| floor[i].intersects_triangle(&ceiling[j]),
//!     Schedule::ParallelLazy,
//! )
//! .unwrap();
//! assert!(pairs.is_empty());
//!
//! let closest = nearest_shape(&a, &floor, &Point3::new(42.2, 0.2, 3.0)).unwrap();
//! assert_eq!(closest.primitive, 42);
//! assert!((closest.distance - 3.0).abs() < 1e-12);
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - parallel construction passes and wavefront traversal
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for some types
//!
//! [`Hierarchy`]: bounding_hierarchy::Hierarchy
//! [`KeyTree`]: bvh::KeyTree
//! [`AxisTree`]: bvh::AxisTree
//! [`ExactTest`]: traverse::ExactTest
//! [`DistanceFunctor`]: traverse::DistanceFunctor

pub mod aabb;
pub mod bounding_hierarchy;
pub mod bounding_volume;
pub mod bvh;
pub mod error;
pub mod morton;
pub mod point_query;
pub mod shapes;
pub mod traverse;
mod utils;

#[cfg(test)]
mod testbase;

pub use error::{BvhError, Result};
