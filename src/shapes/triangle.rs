//! This module defines a Triangle and its intersection algorithms

use nalgebra::{Point3, Vector3};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::point_query::PointDistance;
use crate::shapes::{cross_axis, separated, Segment};

/// A triangle in 3D. Instance of a more complex [`Bounded`] primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle<T: BHValue> {
    /// First point on the triangle
    pub a: Point3<T>,
    /// Second point on the triangle
    pub b: Point3<T>,
    /// Third point on the triangle
    pub c: Point3<T>,
}

impl<T: BHValue> Triangle<T> {
    /// Creates a new triangle given a counter clockwise set of points
    pub fn new(a: Point3<T>, b: Point3<T>, c: Point3<T>) -> Triangle<T> {
        Triangle { a, b, c }
    }

    /// The corners in order.
    pub fn vertices(&self) -> [Point3<T>; 3] {
        [self.a, self.b, self.c]
    }

    /// The edge vectors `b - a`, `c - b` and `a - c`.
    pub fn edges(&self) -> [Vector3<T>; 3] {
        [self.b - self.a, self.c - self.b, self.a - self.c]
    }

    /// The unnormalized normal, `(b - a) × (c - a)`.
    pub fn normal(&self) -> Vector3<T> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Returns the point of the triangle closest to `p`.
    pub fn closest_point(&self, p: &Point3<T>) -> Point3<T> {
        // Voronoi region classification, see Ericson, Real-Time Collision Detection, 5.1.5.
        let zero = T::zero();
        let ab = self.b - self.a;
        let ac = self.c - self.a;

        let ap = p - self.a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= zero && d2 <= zero {
            return self.a;
        }

        let bp = p - self.b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= zero && d4 <= d3 {
            return self.b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= zero && d1 >= zero && d3 <= zero {
            return self.a + ab * (d1 / (d1 - d3));
        }

        let cp = p - self.c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= zero && d5 <= d6 {
            return self.c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= zero && d2 >= zero && d6 <= zero {
            return self.a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= zero && d4 - d3 >= zero && d5 - d6 >= zero {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.b + (self.c - self.b) * w;
        }

        let denom = T::one() / (va + vb + vc);
        self.a + ab * (vb * denom) + ac * (vc * denom)
    }

    /// Returns true if the two triangles share at least one point. Touching triangles
    /// intersect.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::shapes::Triangle;
    /// use nalgebra::Point3;
    ///
    /// let floor = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    ///     Point3::new(0.0, 2.0, 0.0),
    /// );
    /// let wall = Triangle::new(
    ///     Point3::new(0.5, 0.5, -1.0),
    ///     Point3::new(0.5, 0.5, 1.0),
    ///     Point3::new(3.0, 3.0, 0.0),
    /// );
    /// let far = Triangle::new(
    ///     Point3::new(0.0, 0.0, 5.0),
    ///     Point3::new(2.0, 0.0, 5.0),
    ///     Point3::new(0.0, 2.0, 5.0),
    /// );
    /// assert!(floor.intersects_triangle(&wall));
    /// assert!(!floor.intersects_triangle(&far));
    /// ```
    pub fn intersects_triangle(&self, other: &Triangle<T>) -> bool {
        let ours = self.vertices();
        let theirs = other.vertices();
        let our_edges = self.edges();
        let their_edges = other.edges();
        let our_normal = cross_axis(&our_edges[0], &-our_edges[2]);
        let their_normal = cross_axis(&their_edges[0], &-their_edges[2]);

        let mut axes = Vec::with_capacity(17);
        axes.extend(our_normal);
        axes.extend(their_normal);
        for u in &our_edges {
            for v in &their_edges {
                axes.extend(cross_axis(u, v));
            }
        }
        // In-plane edge normals separate coplanar triangles.
        if let Some(normal) = our_normal {
            axes.extend(our_edges.iter().filter_map(|e| cross_axis(&normal, e)));
        }
        if let Some(normal) = their_normal {
            axes.extend(their_edges.iter().filter_map(|e| cross_axis(&normal, e)));
        }

        !axes.iter().any(|axis| separated(&ours, &theirs, axis))
    }

    /// Returns true if the segment touches the triangle.
    pub fn intersects_segment(&self, segment: &Segment<T>) -> bool {
        let ours = self.vertices();
        let theirs = [segment.start, segment.end];
        let edges = self.edges();
        let direction = segment.direction();
        let normal = cross_axis(&edges[0], &-edges[2]);

        let mut axes = Vec::with_capacity(8);
        axes.extend(normal);
        axes.extend(edges.iter().filter_map(|e| cross_axis(e, &direction)));
        if let Some(normal) = normal {
            axes.extend(edges.iter().filter_map(|e| cross_axis(&normal, e)));
            axes.extend(cross_axis(&normal, &direction));
        }

        !axes.iter().any(|axis| separated(&ours, &theirs, axis))
    }
}

impl<T: BHValue> Bounded<T, 3> for Triangle<T> {
    fn aabb(&self) -> Aabb<T, 3> {
        Aabb::empty().grow(&self.a).grow(&self.b).grow(&self.c)
    }
}

impl<T: BHValue> PointDistance<T, 3> for Triangle<T> {
    fn distance_squared(&self, query_point: Point3<T>) -> T {
        let offset = self.closest_point(&query_point) - query_point;
        offset.dot(&offset)
    }
}
