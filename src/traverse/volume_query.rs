//! Region queries: collect the primitives of every leaf a query volume reaches.

use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::{BHValue, Hierarchy, NodeId, PrimitiveId};
use crate::bounding_volume::BoundingVolume;
use crate::error::{BvhError, Result};

/// Returns the primitives of every leaf whose volume intersects `volume`.
///
/// The result is a candidate set: it contains every primitive whose leaf volume
/// overlaps the query, possibly more than the primitives that actually do.
pub fn query_volume<T, const D: usize, H>(tree: &H, volume: &H::Volume) -> Result<Vec<PrimitiveId>>
where
    T: BHValue,
    H: Hierarchy<T, D>,
{
    collect_leaves::<T, D, H, _>(tree, |node_volume| node_volume.intersects(volume))
}

/// Returns the primitives of every leaf whose box is hit by `query`, for hierarchies
/// over [`Aabb`]s. Like [`query_volume`], the result may contain false positives.
///
/// # Examples
/// ```
/// use pairwise_bvh::aabb::Aabb;
/// use pairwise_bvh::bvh::KeyTree;
/// use pairwise_bvh::traverse::query_intersecting;
/// use nalgebra::Point3;
///
/// let boxes: Vec<Aabb<f32, 3>> = (0..8)
///     .map(|i| Aabb::with_bounds(Point3::new(i as f32, 0.0, 0.0), Point3::new(i as f32 + 0.5, 1.0, 1.0)))
///     .collect();
/// let tree = KeyTree::from_shapes(&boxes, 1).unwrap();
/// let hits = query_intersecting(&tree, &Point3::new(3.25, 0.5, 0.5)).unwrap();
/// assert_eq!(hits, vec![3]);
/// ```
pub fn query_intersecting<T, const D: usize, H, Q>(tree: &H, query: &Q) -> Result<Vec<PrimitiveId>>
where
    T: BHValue,
    H: Hierarchy<T, D, Volume = Aabb<T, D>>,
    Q: IntersectsAabb<T, D>,
{
    collect_leaves::<T, D, H, _>(tree, |aabb: &Aabb<T, D>| query.intersects_aabb(aabb))
}

fn collect_leaves<T, const D: usize, H, F>(tree: &H, visit: F) -> Result<Vec<PrimitiveId>>
where
    T: BHValue,
    H: Hierarchy<T, D>,
    F: Fn(&H::Volume) -> bool,
{
    let root = tree.root().ok_or(BvhError::EmptyTree)?;
    let mut hits = Vec::new();
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(id) = stack.pop() {
        let view = tree.node(id);
        if !visit(view.volume) {
            continue;
        }
        match view.children {
            Some((left, right)) => {
                stack.push(right);
                stack.push(left);
            }
            None => hits.extend(view.range().map(|slot| tree.item(slot))),
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::{query_intersecting, query_volume};
    use crate::aabb::Bounded;
    use crate::bvh::{AxisTree, CenterDivider, KeyTree};
    use crate::error::BvhError;
    use crate::testbase::{random_triangles, sorted, TAabb3, TKeyTree, TPoint3, Triangle};

    #[test]
    /// Candidates include every primitive whose box overlaps the query.
    fn test_query_volume_is_conservative() {
        let triangles = random_triangles(400, 31);
        let query = TAabb3::with_bounds(TPoint3::new(-10.0, -10.0, -10.0), TPoint3::new(15.0, 5.0, 20.0));
        let expected: Vec<usize> = (0..triangles.len())
            .filter(|&i| triangles[i].aabb().overlaps(&query))
            .collect();

        let tree: TKeyTree = KeyTree::from_shapes(&triangles, 1).unwrap();
        // Leaves of one primitive have exactly that primitive's box.
        assert_eq!(sorted(query_volume(&tree, &query).unwrap()), expected);

        let tree = AxisTree::lazy(CenterDivider::new(&triangles), 4).unwrap();
        let candidates = query_volume(&tree, &query).unwrap();
        assert!(expected.iter().all(|i| candidates.contains(i)));
        assert!(tree.sorted_count() < tree.nodes().len());
    }

    #[test]
    /// A point query returns the triangles whose boxes contain the point.
    fn test_query_intersecting_point() {
        let triangles = random_triangles(300, 32);
        let tree = AxisTree::build(CenterDivider::new(&triangles), 1).unwrap();
        for target in [0, 150, 299] {
            let point = triangles[target].b;
            let hits = sorted(query_intersecting(&tree, &point).unwrap());
            let expected: Vec<usize> = (0..triangles.len())
                .filter(|&i| triangles[i].aabb().contains(&point))
                .collect();
            assert!(hits.contains(&target));
            assert_eq!(hits, expected);
        }
    }

    #[test]
    fn test_query_volume_empty() {
        let empty: Vec<Triangle> = Vec::new();
        let tree: TKeyTree = KeyTree::from_shapes(&empty, 1).unwrap();
        assert_eq!(
            query_volume(&tree, &TAabb3::infinite()),
            Err(BvhError::EmptyTree)
        );
    }
}
