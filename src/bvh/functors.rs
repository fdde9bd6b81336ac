//! Strategy objects supplied by callers to build hierarchies.
//!
//! The key-ordered build takes a [`KeyFunctor`] and a [`BoxFunctor`], the axis-split
//! build takes a [`Divider`]. Closures implement the first two directly.

use core::cmp::Ordering;
use core::marker::PhantomData;

use num_traits::{PrimInt, Unsigned};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{BHValue, PrimitiveId};
use crate::bounding_volume::BoundingVolume;
use crate::utils::joint_aabb_of_shapes;

/// Assigns every primitive a scalar sort key, e.g. a Morton code of its centroid.
pub trait KeyFunctor: Sync {
    /// The unsigned integer key type.
    type Key: PrimInt + Unsigned + Send + Sync;

    /// Returns the key of `primitive`.
    fn key(&self, primitive: PrimitiveId) -> Self::Key;
}

impl<K, F> KeyFunctor for F
where
    K: PrimInt + Unsigned + Send + Sync,
    F: Fn(PrimitiveId) -> K + Sync,
{
    type Key = K;

    fn key(&self, primitive: PrimitiveId) -> K {
        self(primitive)
    }
}

/// Computes the bounding volume of a range of primitives.
pub trait BoxFunctor<T: BHValue, const D: usize>: Sync {
    /// The produced bounding volume.
    type Volume: BoundingVolume<T, D>;

    /// Returns a volume enclosing every primitive in `items`.
    fn bound(&self, items: &[PrimitiveId]) -> Self::Volume;
}

impl<T, const D: usize, V, F> BoxFunctor<T, D> for F
where
    T: BHValue,
    V: BoundingVolume<T, D>,
    F: Fn(&[PrimitiveId]) -> V + Sync,
{
    type Volume = V;

    fn bound(&self, items: &[PrimitiveId]) -> V {
        self(items)
    }
}

/// Bounds ranges of [`Bounded`] shapes by joining their boxes.
#[derive(Debug)]
pub struct ShapeBoxes<'a, T: BHValue, const D: usize, S> {
    shapes: &'a [S],
    marker: PhantomData<T>,
}

impl<'a, T: BHValue, const D: usize, S: Bounded<T, D>> ShapeBoxes<'a, T, D, S> {
    /// Creates the functor over `shapes`.
    pub fn new(shapes: &'a [S]) -> Self {
        ShapeBoxes {
            shapes,
            marker: PhantomData,
        }
    }
}

impl<T: BHValue, const D: usize, S: Bounded<T, D> + Sync> BoxFunctor<T, D>
    for ShapeBoxes<'_, T, D, S>
{
    type Volume = Aabb<T, D>;

    fn bound(&self, items: &[PrimitiveId]) -> Aabb<T, D> {
        joint_aabb_of_shapes(items, self.shapes).0
    }
}

/// The outcome of dividing a node's range: the node's own volume and the axis
/// along which its items are ordered before the median split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Division<V> {
    /// Volume enclosing every primitive in the range.
    pub volume: V,
    /// The axis used by [`Divider::compare`] to order the range.
    pub axis: usize,
}

/// Decides how the axis-split build partitions a node.
pub trait Divider<T: BHValue, const D: usize>: Sync {
    /// The produced bounding volume.
    type Volume: BoundingVolume<T, D>;

    /// The number of primitives the divider can see.
    fn primitive_count(&self) -> usize;

    /// Computes the volume of `items` and the axis to split them along.
    fn divide(&self, items: &[PrimitiveId]) -> Division<Self::Volume>;

    /// Orders two primitives along `axis`.
    fn compare(&self, axis: usize, a: PrimitiveId, b: PrimitiveId) -> Ordering;
}

/// The default [`Divider`]: a node's volume encloses the boxes of its shapes and the
/// split axis is the one along which the box centers are spread the most.
#[derive(Debug)]
pub struct CenterDivider<'a, T: BHValue, const D: usize, S> {
    shapes: &'a [S],
    centers: Vec<nalgebra::Point<T, D>>,
}

impl<'a, T: BHValue, const D: usize, S: Bounded<T, D>> CenterDivider<'a, T, D, S> {
    /// Creates a divider over `shapes`, caching their box centers.
    pub fn new(shapes: &'a [S]) -> Self {
        let centers = shapes.iter().map(|shape| shape.aabb().center()).collect();
        CenterDivider { shapes, centers }
    }
}

impl<T: BHValue, const D: usize, S: Bounded<T, D> + Sync> Divider<T, D>
    for CenterDivider<'_, T, D, S>
{
    type Volume = Aabb<T, D>;

    fn primitive_count(&self) -> usize {
        self.shapes.len()
    }

    fn divide(&self, items: &[PrimitiveId]) -> Division<Aabb<T, D>> {
        let (volume, centroid) = joint_aabb_of_shapes(items, self.shapes);
        Division {
            volume,
            axis: centroid.largest_axis(),
        }
    }

    fn compare(&self, axis: usize, a: PrimitiveId, b: PrimitiveId) -> Ordering {
        self.centers[a][axis]
            .partial_cmp(&self.centers[b][axis])
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use core::cmp::Ordering;

    use super::{BoxFunctor, CenterDivider, Divider, KeyFunctor, ShapeBoxes};
    use crate::testbase::{TAabb3, TPoint3};

    fn boxes() -> Vec<TAabb3> {
        vec![
            TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0)),
            TAabb3::with_bounds(TPoint3::new(0.0, 8.0, 0.0), TPoint3::new(1.0, 9.0, 1.0)),
            TAabb3::with_bounds(TPoint3::new(0.0, 4.0, -20.0), TPoint3::new(1.0, 5.0, 20.0)),
        ]
    }

    #[test]
    fn test_closures_are_functors() {
        let keys = |primitive: usize| (primitive as u32) * 2;
        assert_eq!(keys.key(3), 6);

        let shapes = boxes();
        let bound = |items: &[usize]| shapes[items[0]];
        assert_eq!(BoxFunctor::<f64, 3>::bound(&bound, &[1]), shapes[1]);
    }

    #[test]
    fn test_shape_boxes_joins_range() {
        let shapes = boxes();
        let functor = ShapeBoxes::new(&shapes);
        let volume = functor.bound(&[0, 2]);
        assert_eq!(volume.min, TPoint3::new(0.0, 0.0, -20.0));
        assert_eq!(volume.max, TPoint3::new(1.0, 5.0, 20.0));
    }

    #[test]
    /// The axis follows the spread of the centers, not the extent of the boxes.
    fn test_center_divider_axis() {
        let shapes = boxes();
        let divider = CenterDivider::new(&shapes);
        let division = divider.divide(&[0, 1, 2]);
        assert_eq!(division.axis, 1);
        assert_eq!(division.volume.min.z, -20.0);
        assert_eq!(divider.compare(1, 0, 1), Ordering::Less);
        assert_eq!(divider.compare(1, 1, 2), Ordering::Greater);
        assert_eq!(divider.primitive_count(), 3);
    }
}
