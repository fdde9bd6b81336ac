//! Primitives with exact intersection and distance tests, usable as
//! [`ExactTest`](crate::traverse::ExactTest) and distance collaborators of the queries.

mod segment;
mod triangle;

pub use segment::*;
pub use triangle::*;

use nalgebra::{Point3, Vector3};
use num_traits::Float;

use crate::bounding_hierarchy::BHValue;

/// Returns `u × v`, or `None` if the two vectors are too close to parallel for the
/// cross product to be a usable separating axis.
fn cross_axis<T: BHValue>(u: &Vector3<T>, v: &Vector3<T>) -> Option<Vector3<T>> {
    let axis = u.cross(v);
    let scale = u.dot(u) * v.dot(v);
    if axis.dot(&axis) > T::epsilon() * scale {
        Some(axis)
    } else {
        None
    }
}

/// Returns true if the projections of the two point sets onto `axis` are disjoint.
/// Touching projections are not separated.
fn separated<T: BHValue>(a: &[Point3<T>], b: &[Point3<T>], axis: &Vector3<T>) -> bool {
    let (min_a, max_a) = project(a, axis);
    let (min_b, max_b) = project(b, axis);
    max_a < min_b || max_b < min_a
}

fn project<T: BHValue>(points: &[Point3<T>], axis: &Vector3<T>) -> (T, T) {
    points.iter().fold((T::infinity(), T::neg_infinity()), |(min, max), p| {
        let d = p.coords.dot(axis);
        (Float::min(min, d), Float::max(max, d))
    })
}
