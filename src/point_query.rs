//! Contains the [`PointDistance`] trait used for querying the distance from a point to a shape.
use crate::bounding_hierarchy::BHValue;

/// A trait implemented by shapes that can be queried for their distance to a point.
///
/// Used by [`nearest_shape`] to find the closest shape in a hierarchy.
///
/// [`nearest_shape`]: crate::traverse::nearest_shape
pub trait PointDistance<T: BHValue, const D: usize> {
    /// Returns the squared distance from this point to the Shape.
    fn distance_squared(&self, query_point: nalgebra::Point<T, D>) -> T;
}
