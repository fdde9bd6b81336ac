//! The [`BoundingVolume`] contract used by every hierarchy node.

use core::fmt::Debug;

use nalgebra::Point;
use num_traits::Float;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;

/// A mergeable, fittable volume enclosing a set of points.
///
/// Implementations must be conservative: [`BoundingVolume::intersects`] may report
/// overlap for volumes that do not overlap, but never the reverse, and
/// [`BoundingVolume::point_distance`] must never exceed the true distance from the
/// point to anything the volume encloses.
pub trait BoundingVolume<T: BHValue, const D: usize>: Clone + Debug + Send + Sync {
    /// Returns a volume that encloses nothing.
    fn empty() -> Self;

    /// Returns the volume to the empty state.
    fn reset(&mut self);

    /// Expands the volume, if necessary, to include `point`.
    fn fit(&mut self, point: &Point<T, D>);

    /// Expands the volume to include `other` entirely.
    fn enclose(&mut self, other: &Self);

    /// Conservative overlap test.
    fn intersects(&self, other: &Self) -> bool;

    /// A lower bound on the distance from `point` to anything enclosed by the volume.
    /// Zero if `point` lies inside.
    fn point_distance(&self, point: &Point<T, D>) -> T;
}

impl<T: BHValue, const D: usize> BoundingVolume<T, D> for Aabb<T, D> {
    fn empty() -> Self {
        Aabb::empty()
    }

    fn reset(&mut self) {
        *self = Aabb::empty();
    }

    fn fit(&mut self, point: &Point<T, D>) {
        self.grow_mut(point);
    }

    fn enclose(&mut self, other: &Self) {
        self.join_mut(other);
    }

    fn intersects(&self, other: &Self) -> bool {
        self.overlaps(other)
    }

    fn point_distance(&self, point: &Point<T, D>) -> T {
        Float::sqrt(self.distance_squared_to_point(point))
    }
}
