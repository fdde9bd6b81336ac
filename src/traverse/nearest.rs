//! Branch-and-bound search for the primitive closest to a point.

use log::trace;
use nalgebra::Point;
use num_traits::Float;

use crate::bounding_hierarchy::{BHValue, Hierarchy, NodeId, PrimitiveId};
use crate::bounding_volume::BoundingVolume;
use crate::error::{BvhError, Result};
use crate::point_query::PointDistance;

/// Computes the exact distance from an implicit query point to a primitive.
///
/// The distance must never be smaller than the [`BoundingVolume::point_distance`] of
/// any volume enclosing the primitive, otherwise pruning becomes unsound.
pub trait DistanceFunctor<T> {
    /// The distance to `primitive`.
    fn distance(&self, primitive: PrimitiveId) -> T;
}

impl<T, F: Fn(PrimitiveId) -> T> DistanceFunctor<T> for F {
    fn distance(&self, primitive: PrimitiveId) -> T {
        self(primitive)
    }
}

/// The closest primitive found by [`nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<T> {
    /// The primitive's index.
    pub primitive: PrimitiveId,
    /// Its distance to the query point.
    pub distance: T,
}

/// Counters collected by [`nearest_with_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestStats {
    /// Nodes whose children or items were inspected.
    pub nodes_visited: usize,
    /// Calls to the distance functor.
    pub distance_evaluations: usize,
    /// Stack entries dropped because a closer primitive was found after pushing them.
    pub stale_pops: usize,
    /// True if the search stopped at a primitive with zero distance.
    pub early_exit: bool,
}

/// Returns the primitive of `tree` minimizing `distance`, using the node volumes'
/// distance to `point` as lower bounds.
///
/// Fails with [`BvhError::EmptyTree`] if the tree holds no primitives. Ties are
/// resolved in favor of the primitive found first.
pub fn nearest<T, const D: usize, H, F>(tree: &H, point: &Point<T, D>, distance: &F) -> Result<Nearest<T>>
where
    T: BHValue,
    H: Hierarchy<T, D>,
    F: DistanceFunctor<T>,
{
    nearest_with_stats(tree, point, distance).map(|(nearest, _)| nearest)
}

/// Like [`nearest`], but also reports how much work the search did.
pub fn nearest_with_stats<T, const D: usize, H, F>(
    tree: &H,
    point: &Point<T, D>,
    distance: &F,
) -> Result<(Nearest<T>, NearestStats)>
where
    T: BHValue,
    H: Hierarchy<T, D>,
    F: DistanceFunctor<T>,
{
    let root = tree.root().ok_or(BvhError::EmptyTree)?;
    let mut stats = NearestStats {
        distance_evaluations: 1,
        ..NearestStats::default()
    };
    let mut best = Nearest {
        primitive: 0,
        distance: distance.distance(0),
    };
    if best.distance <= T::zero() {
        stats.early_exit = true;
        return Ok((best, stats));
    }

    let mut stack: Vec<(NodeId, T)> = Vec::new();
    let mut next = Some(root);
    loop {
        let id = match next.take() {
            Some(id) => id,
            None => match pop_viable(&mut stack, best.distance, &mut stats) {
                Some(id) => id,
                None => break,
            },
        };
        stats.nodes_visited += 1;
        let view = tree.node(id);
        match view.children {
            None => {
                for slot in view.range() {
                    let primitive = tree.item(slot);
                    let d = distance.distance(primitive);
                    stats.distance_evaluations += 1;
                    if d < best.distance {
                        best = Nearest {
                            primitive,
                            distance: d,
                        };
                        if d <= T::zero() {
                            stats.early_exit = true;
                            trace!("nearest search hit primitive {primitive} exactly");
                            return Ok((best, stats));
                        }
                    }
                }
            }
            Some((left, right)) => {
                let left_bound = tree.node(left).volume.point_distance(point);
                let right_bound = tree.node(right).volume.point_distance(point);
                let ((near, near_bound), (far, far_bound)) = if left_bound <= right_bound {
                    ((left, left_bound), (right, right_bound))
                } else {
                    ((right, right_bound), (left, left_bound))
                };
                if near_bound < best.distance {
                    next = Some(near);
                    if far_bound < best.distance {
                        stack.push((far, far_bound));
                    }
                }
            }
        }
    }
    Ok((best, stats))
}

/// Pops the next stack entry that can still beat `best`.
fn pop_viable<T: BHValue>(
    stack: &mut Vec<(NodeId, T)>,
    best: T,
    stats: &mut NearestStats,
) -> Option<NodeId> {
    while let Some((id, bound)) = stack.pop() {
        if bound < best {
            return Some(id);
        }
        stats.stale_pops += 1;
    }
    None
}

/// Returns the shape of `shapes` closest to `point`. `tree` must have been built over
/// `shapes`.
pub fn nearest_shape<T, const D: usize, H, S>(tree: &H, shapes: &[S], point: &Point<T, D>) -> Result<Nearest<T>>
where
    T: BHValue,
    H: Hierarchy<T, D>,
    S: PointDistance<T, D>,
{
    let count = tree.primitive_count();
    if count > shapes.len() {
        return Err(BvhError::IndexOutOfRange {
            index: count - 1,
            len: shapes.len(),
        });
    }
    let distance = |primitive: PrimitiveId| Float::sqrt(shapes[primitive].distance_squared(*point));
    nearest(tree, point, &distance)
}
