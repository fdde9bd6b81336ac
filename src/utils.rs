//! Utilities module.

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{BHValue, PrimitiveId};

/// Concatenates the list of vectors into a single vector.
/// Drains the elements from the source `vectors`.
pub fn concatenate_vectors<T: Sized>(vectors: &mut [Vec<T>]) -> Vec<T> {
    let total = vectors.iter().map(Vec::len).sum();
    let mut result = Vec::with_capacity(total);
    for vector in vectors.iter_mut() {
        result.append(vector);
    }
    result
}

/// Returns the joint [`Aabb`] of the shapes at `indices`, together with the
/// [`Aabb`] of their centers.
pub fn joint_aabb_of_shapes<T: BHValue, const D: usize, Shape: Bounded<T, D>>(
    indices: &[PrimitiveId],
    shapes: &[Shape],
) -> (Aabb<T, D>, Aabb<T, D>) {
    let mut aabb = Aabb::empty();
    let mut centroid = Aabb::empty();
    for index in indices {
        let shape_aabb = shapes[*index].aabb();
        aabb.join_mut(&shape_aabb);
        centroid.grow_mut(&shape_aabb.center());
    }
    (aabb, centroid)
}
