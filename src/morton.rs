//! Morton codes over quantized box centers, the default sort key of the
//! key-ordered build.

use num_traits::Float;

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{BHValue, PrimitiveId};
use crate::bvh::KeyFunctor;

/// The number of bits each axis contributes to a 64-bit Morton code in `D` dimensions.
pub const fn bits_per_axis(dimensions: usize) -> u32 {
    if dimensions == 0 {
        return 0;
    }
    let bits = 64 / dimensions;
    if bits > 32 {
        32
    } else {
        bits as u32
    }
}

/// Interleaves the low `bits_per_axis(D)` bits of every coordinate. Bit `b` of axis
/// `a` lands at position `b * D + a`.
///
/// # Examples
/// ```
/// use pairwise_bvh::morton::encode;
///
/// assert_eq!(encode([1, 0, 0]), 0b001);
/// assert_eq!(encode([0, 1, 0]), 0b010);
/// assert_eq!(encode([1, 1, 1]), 0b111);
/// assert_eq!(encode([2, 0, 0]), 0b001_000);
/// ```
pub fn encode<const D: usize>(coordinates: [u32; D]) -> u64 {
    let bits = bits_per_axis(D);
    let mut code = 0u64;
    for bit in 0..bits {
        for (axis, coordinate) in coordinates.iter().enumerate() {
            let value = u64::from((coordinate >> bit) & 1);
            code |= value << (bit as usize * D + axis);
        }
    }
    code
}

/// Computes Morton codes of the box centers of a shape slice, quantized against the
/// box spanned by all centers.
#[derive(Debug)]
pub struct MortonKeys<T: BHValue, const D: usize> {
    centers: Vec<nalgebra::Point<T, D>>,
    bounds: Aabb<T, D>,
}

impl<T: BHValue, const D: usize> MortonKeys<T, D> {
    /// Creates the key functor for `shapes`.
    pub fn new<S: Bounded<T, D>>(shapes: &[S]) -> Self {
        let centers: Vec<_> = shapes.iter().map(|shape| shape.aabb().center()).collect();
        let bounds = centers
            .iter()
            .fold(Aabb::empty(), |bounds: Aabb<T, D>, center| bounds.grow(center));
        MortonKeys { centers, bounds }
    }

    /// The box spanned by all centers.
    pub fn bounds(&self) -> &Aabb<T, D> {
        &self.bounds
    }

    fn quantize(&self, value: T, axis: usize) -> u32 {
        let bits = bits_per_axis(D);
        let extent = self.bounds.max[axis] - self.bounds.min[axis];
        if !(extent > T::zero()) {
            return 0;
        }
        let max_cell = u32::MAX >> (32 - bits);
        // Narrow scalars may round `max_cell` up past the u32 range.
        let cells = T::from_u32(max_cell).unwrap_or_else(T::one);
        let relative = (value - self.bounds.min[axis]) / extent;
        let relative = Float::max(T::zero(), Float::min(T::one(), relative));
        (relative * cells)
            .floor()
            .to_u32()
            .map_or(max_cell, |cell| cell.min(max_cell))
    }
}

impl<T: BHValue, const D: usize> KeyFunctor for MortonKeys<T, D> {
    type Key = u64;

    fn key(&self, primitive: PrimitiveId) -> u64 {
        let center = self.centers[primitive];
        let mut coordinates = [0u32; D];
        for (axis, coordinate) in coordinates.iter_mut().enumerate() {
            *coordinate = self.quantize(center[axis], axis);
        }
        encode(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::{bits_per_axis, encode, MortonKeys};
    use crate::bvh::KeyFunctor;
    use crate::testbase::TPoint3;
    use nalgebra::Point2;

    #[test]
    fn test_bits_per_axis() {
        assert_eq!(bits_per_axis(1), 32);
        assert_eq!(bits_per_axis(2), 32);
        assert_eq!(bits_per_axis(3), 21);
        assert_eq!(bits_per_axis(4), 16);
    }

    #[test]
    fn test_encode_interleaves() {
        assert_eq!(encode([0b11u32, 0b00, 0b00]), 0b001_001);
        assert_eq!(encode([0b00u32, 0b00, 0b10]), 0b100_000);
        assert_eq!(encode([u32::MAX, 0]), 0x5555_5555_5555_5555);
        assert_eq!(encode([0, u32::MAX]), 0xAAAA_AAAA_AAAA_AAAA);
    }

    #[test]
    /// Keys respect the ordering of points along a single axis.
    fn test_keys_monotonic_along_axis() {
        let points: Vec<TPoint3> = (0..16).map(|x| TPoint3::new(x as f64, 0.0, 0.0)).collect();
        let keys = MortonKeys::new(&points);
        let codes: Vec<u64> = (0..points.len()).map(|i| keys.key(i)).collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(codes[0], 0);
    }

    #[test]
    /// Single precision cannot represent the largest 32-bit cell; the far end of the
    /// axis must still get the largest key.
    fn test_keys_monotonic_f32_2d() {
        let points: Vec<Point2<f32>> = (0..16).map(|x| Point2::new(x as f32, 0.0)).collect();
        let keys = MortonKeys::new(&points);
        let codes: Vec<u64> = (0..points.len()).map(|i| keys.key(i)).collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(codes[15], encode([u32::MAX, 0]));
    }

    #[test]
    /// Coincident centers produce identical keys.
    fn test_degenerate_bounds() {
        let points = vec![TPoint3::new(1.0, 1.0, 1.0); 4];
        let keys = MortonKeys::new(&points);
        assert!((0..4).all(|i| keys.key(i) == 0));
    }
}
