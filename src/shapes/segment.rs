//! This module defines a line segment.

use nalgebra::{Point3, Vector3};
use num_traits::Float;

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::point_query::PointDistance;

/// A line segment between two points in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment<T: BHValue> {
    /// Start of the segment
    pub start: Point3<T>,
    /// End of the segment
    pub end: Point3<T>,
}

impl<T: BHValue> Segment<T> {
    /// Creates a segment from `start` to `end`.
    pub fn new(start: Point3<T>, end: Point3<T>) -> Segment<T> {
        Segment { start, end }
    }

    /// The vector from start to end.
    pub fn direction(&self) -> Vector3<T> {
        self.end - self.start
    }

    /// Returns the point of the segment closest to `p`.
    pub fn closest_point(&self, p: &Point3<T>) -> Point3<T> {
        let direction = self.direction();
        let length_squared = direction.dot(&direction);
        if length_squared <= T::zero() {
            return self.start;
        }
        let t = (p - self.start).dot(&direction) / length_squared;
        let t = Float::max(T::zero(), Float::min(T::one(), t));
        self.start + direction * t
    }
}

impl<T: BHValue> Bounded<T, 3> for Segment<T> {
    fn aabb(&self) -> Aabb<T, 3> {
        Aabb::empty().grow(&self.start).grow(&self.end)
    }
}

impl<T: BHValue> PointDistance<T, 3> for Segment<T> {
    fn distance_squared(&self, query_point: Point3<T>) -> T {
        let offset = self.closest_point(&query_point) - query_point;
        offset.dot(&offset)
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use crate::aabb::Bounded;
    use crate::point_query::PointDistance;
    use crate::shapes::Segment;
    use crate::testbase::TPoint3;

    #[test]
    fn test_segment_distance() {
        let segment = Segment::new(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(2.0, 0.0, 0.0));
        assert_float_eq!(segment.distance_squared(TPoint3::new(1.0, 3.0, 0.0)), 9.0, abs <= 1e-12);
        assert_float_eq!(segment.distance_squared(TPoint3::new(-1.0, 0.0, 0.0)), 1.0, abs <= 1e-12);
        assert_float_eq!(segment.distance_squared(TPoint3::new(5.0, 0.0, 4.0)), 25.0, abs <= 1e-12);

        let point = Segment::new(TPoint3::new(1.0, 1.0, 1.0), TPoint3::new(1.0, 1.0, 1.0));
        assert_float_eq!(point.distance_squared(TPoint3::new(1.0, 1.0, 2.0)), 1.0, abs <= 1e-12);
    }

    #[test]
    fn test_segment_aabb() {
        let segment = Segment::new(TPoint3::new(3.0, -1.0, 0.0), TPoint3::new(1.0, 2.0, 0.0));
        let aabb = segment.aabb();
        assert_eq!(aabb.min, TPoint3::new(1.0, -1.0, 0.0));
        assert_eq!(aabb.max, TPoint3::new(3.0, 2.0, 0.0));
    }
}
