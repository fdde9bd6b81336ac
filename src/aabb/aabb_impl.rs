//! Axis Aligned Bounding Boxes.

use core::fmt;

use nalgebra::{Point, SVector};
use num_traits::Float;

use crate::bounding_hierarchy::BHValue;

/// [`Aabb`] struct.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<T: BHValue, const D: usize> {
    /// Minimum coordinates
    pub min: Point<T, D>,

    /// Maximum coordinates
    pub max: Point<T, D>,
}

impl<T: BHValue + fmt::Display, const D: usize> fmt::Display for Aabb<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Min bound: {}; Max bound: {}", self.min, self.max)
    }
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
///
/// [`Aabb`]: struct.Aabb.html
///
pub trait Bounded<T: BHValue, const D: usize> {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::{Aabb, Bounded};
    /// use nalgebra::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded<f32, 3> for Something {
    ///     fn aabb(&self) -> Aabb<f32, 3> {
    ///         let point1 = Point3::new(0.0, 0.0, 0.0);
    ///         let point2 = Point3::new(1.0, 1.0, 1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    fn aabb(&self) -> Aabb<T, D>;
}

impl<T: BHValue, const D: usize, B: Bounded<T, D>> Bounded<T, D> for &B {
    fn aabb(&self) -> Aabb<T, D> {
        B::aabb(self)
    }
}

impl<T: BHValue, const D: usize> Aabb<T, D> {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn with_bounds(min: Point<T, D>, max: Point<T, D>) -> Self {
        Aabb { min, max }
    }

    /// Creates a new empty [`Aabb`]. Its minimum lies at positive infinity and its
    /// maximum at negative infinity, so the first point it is grown by defines it.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    ///
    /// let aabb = Aabb::<f32, 3>::empty();
    /// assert!(aabb.is_empty());
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn empty() -> Self {
        Self {
            min: Point::<T, D>::from(SVector::<T, D>::repeat(T::infinity())),
            max: Point::<T, D>::from(SVector::<T, D>::repeat(T::neg_infinity())),
        }
    }

    /// Creates a new infinite [`Aabb`] that contains every point.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn infinite() -> Self {
        Self {
            min: Point::<T, D>::from(SVector::<T, D>::repeat(T::neg_infinity())),
            max: Point::<T, D>::from(SVector::<T, D>::repeat(T::infinity())),
        }
    }

    /// Returns true if the [`Point`] is inside the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let min = Point3::new(-1.0, -1.0, -1.0);
    /// let max = Point3::new(1.0, 1.0, 1.0);
    /// let aabb = Aabb::with_bounds(min, max);
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(!aabb.contains(&Point3::new(2.0, 0.0, 0.0)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn contains(&self, p: &Point<T, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns true if the [`Point`] is approximately inside the [`Aabb`]
    /// with respect to some `epsilon`.
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn approx_contains_eps(&self, p: &Point<T, D>, epsilon: T) -> bool {
        (0..D).all(|i| (p[i] - self.min[i]) > -epsilon && (p[i] - self.max[i]) < epsilon)
    }

    /// Returns true if the `other` [`Aabb`] is approximately inside this [`Aabb`]
    /// with respect to some `epsilon`.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn approx_contains_aabb_eps(&self, other: &Aabb<T, D>, epsilon: T) -> bool {
        self.approx_contains_eps(&other.min, epsilon) && self.approx_contains_eps(&other.max, epsilon)
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert!(joint.contains(&Point3::new(-100.5, 0.5, 0.5)));
    /// assert!(joint.contains(&Point3::new(0.0, 0.5, 0.5)));
    /// assert!(joint.contains(&Point3::new(100.5, 0.5, 0.5)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn join(&self, other: &Aabb<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Mutable version of [`Aabb::join`].
    ///
    /// [`Aabb::join`]: struct.Aabb.html
    ///
    pub fn join_mut(&mut self, other: &Aabb<T, D>) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point`] `other`.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let point1 = Point3::new(0.0, 0.0, 0.0);
    /// let point2 = Point3::new(1.0, 1.0, 1.0);
    /// let aabb = Aabb::empty().grow(&point1).grow(&point2);
    ///
    /// assert!(aabb.contains(&Point3::new(0.5, 0.5, 0.5)));
    /// assert!(!aabb.contains(&Point3::new(1.5, 0.5, 0.5)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn grow(&self, other: &Point<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(self.min.inf(other), self.max.sup(other))
    }

    /// Mutable version of [`Aabb::grow`].
    ///
    /// [`Aabb::grow`]: struct.Aabb.html
    ///
    pub fn grow_mut(&mut self, other: &Point<T, D>) {
        *self = self.grow(other);
    }

    /// Returns true if this [`Aabb`] overlaps `other`. Touching boxes overlap.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn overlaps(&self, other: &Aabb<T, D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    /// Returns the size of this [`Aabb`] in all dimensions.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn size(&self) -> SVector<T, D> {
        self.max - self.min
    }

    /// Returns the center [`Point`] of the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0));
    /// assert_eq!(aabb.center(), Point3::new(1.0, 0.0, 0.0));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn center(&self) -> Point<T, D> {
        let half = T::from_f32(0.5).unwrap_or_else(T::zero);
        self.min + self.size() * half
    }

    /// An empty [`Aabb`] is an [`Aabb`] where the lower bound is greater than
    /// the upper bound in at least one component.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// Ties resolve to the lowest axis.
    ///
    /// # Examples
    /// ```
    /// use pairwise_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-100.0, 0.0, 0.0), Point3::new(100.0, 0.0, 0.0));
    /// assert_eq!(aabb.largest_axis(), 0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn largest_axis(&self) -> usize {
        let size = self.size();
        let mut axis = 0;
        for i in 1..D {
            if size[i] > size[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Returns the squared euclidean distance from `point` to the closest point of the box.
    /// Zero if the point lies inside. An empty box is infinitely far away.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn distance_squared_to_point(&self, point: &Point<T, D>) -> T {
        if self.is_empty() {
            return T::infinity();
        }
        let mut distance_squared = T::zero();
        for i in 0..D {
            let closest = Float::max(self.min[i], Float::min(point[i], self.max[i]));
            let delta = point[i] - closest;
            distance_squared = distance_squared + delta * delta;
        }
        distance_squared
    }
}

impl<T: BHValue, const D: usize> Default for Aabb<T, D> {
    fn default() -> Aabb<T, D> {
        Aabb::empty()
    }
}

/// Implementation of [`Bounded`] for [`Aabb`].
impl<T: BHValue, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        *self
    }
}

/// Implementation of [`Bounded`] for [`Point`].
impl<T: BHValue, const D: usize> Bounded<T, D> for Point<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::with_bounds(*self, *self)
    }
}
